//! Home Assistant Registries
//!
//! This crate provides persistent registries for tracking:
//! - Entities (EntityRegistry)
//! - Devices (DeviceRegistry)
//!
//! All registries use JSON persistence in the `.storage/` directory
//! with versioning.

pub mod storage;

pub mod device_registry;
pub mod entity_registry;

// Re-export main types
pub use storage::{Storable, Storage, StorageError, StorageFile, StorageResult};

pub use entity_registry::{
    DisabledBy, EntityCategory, EntityEntry, EntityMigration, EntityRegistration,
    EntityRegistry, EntityRegistryData, EntityRegistryError, HiddenBy,
};

pub use device_registry::{
    format_mac, DeviceConnection, DeviceEntry, DeviceIdentifier, DeviceInfo, DeviceRegistry,
    DeviceRegistryData,
};

use std::sync::Arc;

/// All registries bundled together
pub struct Registries {
    pub storage: Arc<Storage>,
    pub entities: EntityRegistry,
    pub devices: DeviceRegistry,
}

impl Registries {
    /// Create new registries with the given config directory
    pub fn new(config_dir: impl AsRef<std::path::Path>) -> Self {
        let storage = Arc::new(Storage::new(config_dir));

        Self {
            entities: EntityRegistry::new(storage.clone()),
            devices: DeviceRegistry::new(storage.clone()),
            storage,
        }
    }

    /// Load all registries from storage
    pub async fn load_all(&self) -> StorageResult<()> {
        self.entities.load().await?;
        self.devices.load().await?;
        Ok(())
    }

    /// Save all registries to storage
    pub async fn save_all(&self) -> StorageResult<()> {
        self.entities.save().await?;
        self.devices.save().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_registries_bundle() {
        let temp_dir = TempDir::new().unwrap();
        let registries = Registries::new(temp_dir.path());

        let device = registries.devices.get_or_create(
            "entry1",
            &DeviceInfo {
                connections: vec![DeviceConnection::mac("AA:BB:CC:DD:EE:FF")],
                name: Some("Pentair DD-EE-FF".to_string()),
                ..Default::default()
            },
        );
        registries.entities.get_or_create(
            EntityRegistration::new("sensor", "screenlogic", "aa:bb:cc:dd:ee:ff_air_temperature")
                .config_entry_id("entry1")
                .device_id(device.id.clone()),
        );

        registries.save_all().await.unwrap();

        let reloaded = Registries::new(temp_dir.path());
        reloaded.load_all().await.unwrap();

        assert_eq!(reloaded.entities.len(), 1);
        assert_eq!(reloaded.devices.len(), 1);
        assert_eq!(reloaded.entities.get_by_device_id(&device.id).len(), 1);
    }
}
