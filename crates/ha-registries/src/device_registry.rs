//! Device Registry
//!
//! Tracks all registered devices with identifiers, connections,
//! and config entry links.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ha_core::CONNECTION_NETWORK_MAC;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entity_registry::DisabledBy;
use crate::storage::{Storable, Storage, StorageResult};

/// Storage key for device registry
pub const STORAGE_KEY: &str = "core.device_registry";
/// Current storage version
pub const STORAGE_VERSION: u32 = 1;
/// Current minor version
pub const STORAGE_MINOR_VERSION: u32 = 12;

/// A device identifier (domain, id) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier(pub String, pub String);

impl DeviceIdentifier {
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Self {
        Self(domain.into(), id.into())
    }

    fn key(&self) -> String {
        format!("{}:{}", self.0, self.1)
    }
}

/// A device connection (type, id) pair, e.g. `("mac", "aa:bb:cc:dd:ee:ff")`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceConnection(pub String, pub String);

impl DeviceConnection {
    /// Create a connection, normalizing MAC addresses
    pub fn new(conn_type: impl Into<String>, id: impl Into<String>) -> Self {
        let conn_type = conn_type.into();
        let id = id.into();
        let id = if conn_type == CONNECTION_NETWORK_MAC {
            format_mac(&id)
        } else {
            id
        };
        Self(conn_type, id)
    }

    pub fn mac(mac: &str) -> Self {
        Self::new(CONNECTION_NETWORK_MAC, mac)
    }

    fn key(&self) -> String {
        format!("{}:{}", self.0, self.1)
    }
}

/// Format a MAC address for storage (matches HA's format_mac).
///
/// Colon, dash, dot and bare-hex forms become lowercase colon-separated;
/// anything else is returned unchanged.
pub fn format_mac(mac: &str) -> String {
    let separators = |sep: char| mac.chars().filter(|c| *c == sep).count();

    if mac.len() == 17 && separators(':') == 5 {
        return mac.to_lowercase();
    }

    let hex = if mac.len() == 17 && separators('-') == 5 {
        mac.replace('-', "")
    } else if mac.len() == 14 && separators('.') == 2 {
        mac.replace('.', "")
    } else if mac.len() == 12 && mac.chars().all(|c| c.is_ascii_hexdigit()) {
        mac.to_string()
    } else {
        return mac.to_string();
    };

    let hex = hex.to_lowercase();
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

/// A registered device entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,

    #[serde(default)]
    pub identifiers: Vec<DeviceIdentifier>,
    #[serde(default)]
    pub connections: Vec<DeviceConnection>,
    #[serde(default)]
    pub config_entries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_config_entry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_by_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<DisabledBy>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl DeviceEntry {
    /// Get display name (user name or device name)
    pub fn display_name(&self) -> &str {
        self.name_by_user
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }
}

/// Device attributes an integration reports when registering a device
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub identifiers: Vec<DeviceIdentifier>,
    pub connections: Vec<DeviceConnection>,
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    /// Overwrite reported attributes; unset fields keep the stored value
    fn apply_to(&self, entry: &mut DeviceEntry) {
        for identifier in &self.identifiers {
            if !entry.identifiers.contains(identifier) {
                entry.identifiers.push(identifier.clone());
            }
        }
        for connection in &self.connections {
            if !entry.connections.contains(connection) {
                entry.connections.push(connection.clone());
            }
        }
        if self.name.is_some() {
            entry.name = self.name.clone();
        }
        if self.manufacturer.is_some() {
            entry.manufacturer = self.manufacturer.clone();
        }
        if self.model.is_some() {
            entry.model = self.model.clone();
        }
        if self.sw_version.is_some() {
            entry.sw_version = self.sw_version.clone();
        }
    }
}

/// Device registry data for storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceRegistryData {
    pub devices: Vec<DeviceEntry>,
}

impl Storable for DeviceRegistryData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Device Registry
///
/// Entries are stored as `Arc<DeviceEntry>` to avoid cloning on reads.
pub struct DeviceRegistry {
    storage: Arc<Storage>,

    /// Primary index: device_id -> DeviceEntry
    by_id: DashMap<String, Arc<DeviceEntry>>,

    /// Index: identifier key -> device_id
    by_identifier: DashMap<String, String>,

    /// Index: connection key -> device_id
    by_connection: DashMap<String, String>,

    /// Index: config_entry_id -> set of device_ids
    by_config_entry_id: DashMap<String, HashSet<String>>,
}

impl DeviceRegistry {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            by_id: DashMap::new(),
            by_identifier: DashMap::new(),
            by_connection: DashMap::new(),
            by_config_entry_id: DashMap::new(),
        }
    }

    /// Load from storage
    pub async fn load(&self) -> StorageResult<()> {
        if let Some(data) = self.storage.load::<DeviceRegistryData>().await? {
            info!("Loading {} devices from storage", data.devices.len());
            for entry in data.devices {
                self.index_entry(Arc::new(entry));
            }
        }
        Ok(())
    }

    /// Save to storage
    pub async fn save(&self) -> StorageResult<()> {
        let mut devices: Vec<DeviceEntry> = self.iter().iter().map(|d| (**d).clone()).collect();
        devices.sort_by_key(|d| d.created_at);
        let data = DeviceRegistryData { devices };
        self.storage.save(&data).await?;
        debug!("Saved {} devices to storage", data.devices.len());
        Ok(())
    }

    fn index_entry(&self, entry: Arc<DeviceEntry>) {
        let device_id = entry.id.clone();

        for identifier in &entry.identifiers {
            self.by_identifier
                .insert(identifier.key(), device_id.clone());
        }
        for connection in &entry.connections {
            self.by_connection
                .insert(connection.key(), device_id.clone());
        }
        for config_entry_id in &entry.config_entries {
            self.by_config_entry_id
                .entry(config_entry_id.clone())
                .or_default()
                .insert(device_id.clone());
        }

        self.by_id.insert(device_id, entry);
    }

    fn unindex_entry(&self, entry: &DeviceEntry) {
        for identifier in &entry.identifiers {
            self.by_identifier.remove(&identifier.key());
        }
        for connection in &entry.connections {
            self.by_connection.remove(&connection.key());
        }
        for config_entry_id in &entry.config_entries {
            if let Some(mut ids) = self.by_config_entry_id.get_mut(config_entry_id) {
                ids.remove(&entry.id);
            }
        }
    }

    pub fn get(&self, device_id: &str) -> Option<Arc<DeviceEntry>> {
        self.by_id.get(device_id).map(|r| Arc::clone(r.value()))
    }

    pub fn get_by_identifier(&self, domain: &str, id: &str) -> Option<Arc<DeviceEntry>> {
        let device_id = self
            .by_identifier
            .get(&DeviceIdentifier::new(domain, id).key())
            .map(|r| r.value().clone())?;
        self.get(&device_id)
    }

    /// Get device by connection; MAC addresses are normalized before lookup
    pub fn get_by_connection(&self, conn_type: &str, id: &str) -> Option<Arc<DeviceEntry>> {
        let device_id = self
            .by_connection
            .get(&DeviceConnection::new(conn_type, id).key())
            .map(|r| r.value().clone())?;
        self.get(&device_id)
    }

    pub fn get_by_config_entry_id(&self, config_entry_id: &str) -> Vec<Arc<DeviceEntry>> {
        self.by_config_entry_id
            .get(config_entry_id)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    fn find(&self, info: &DeviceInfo) -> Option<Arc<DeviceEntry>> {
        info.identifiers
            .iter()
            .find_map(|i| self.get_by_identifier(&i.0, &i.1))
            .or_else(|| {
                info.connections
                    .iter()
                    .find_map(|c| self.get_by_connection(&c.0, &c.1))
            })
    }

    /// Get or create a device for a config entry
    ///
    /// Looks up by identifiers first, then connections. An existing device
    /// gains the config entry, any new identifiers/connections, and the
    /// reported attributes.
    pub fn get_or_create(&self, config_entry_id: &str, info: &DeviceInfo) -> Arc<DeviceEntry> {
        if let Some(existing) = self.find(info) {
            debug!("Found existing device: {}", existing.id);
            let updated = self.update(&existing.id, |entry| {
                info.apply_to(entry);
                if !entry.config_entries.iter().any(|id| id == config_entry_id) {
                    entry.config_entries.push(config_entry_id.to_string());
                }
                if entry.primary_config_entry.is_none() {
                    entry.primary_config_entry = Some(config_entry_id.to_string());
                }
            });
            return updated.unwrap_or(existing);
        }

        let now = Utc::now();
        let mut entry = DeviceEntry {
            id: uuid::Uuid::new_v4().simple().to_string(),
            identifiers: Vec::new(),
            connections: Vec::new(),
            config_entries: vec![config_entry_id.to_string()],
            primary_config_entry: Some(config_entry_id.to_string()),
            name: None,
            name_by_user: None,
            manufacturer: None,
            model: None,
            sw_version: None,
            disabled_by: None,
            created_at: now,
            modified_at: now,
        };
        info.apply_to(&mut entry);

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        info!("Registered new device: {:?} ({})", entry.name, entry.id);
        entry
    }

    /// Update a device entry
    pub fn update<F>(&self, device_id: &str, f: F) -> Option<Arc<DeviceEntry>>
    where
        F: FnOnce(&mut DeviceEntry),
    {
        let (_, current) = self.by_id.remove(device_id)?;
        self.unindex_entry(&current);

        let mut entry = (*current).clone();
        f(&mut entry);
        if entry != *current {
            entry.modified_at = Utc::now();
        }

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        Some(entry)
    }

    pub fn remove(&self, device_id: &str) -> Option<Arc<DeviceEntry>> {
        let (_, entry) = self.by_id.remove(device_id)?;
        self.unindex_entry(&entry);
        info!("Removed device: {}", device_id);
        Some(entry)
    }

    /// Detach a config entry from all its devices
    ///
    /// Devices left without any config entry are removed.
    pub fn clear_config_entry(&self, config_entry_id: &str) {
        for device in self.get_by_config_entry_id(config_entry_id) {
            if device.config_entries.len() <= 1 {
                self.remove(&device.id);
                continue;
            }
            self.update(&device.id, |entry| {
                entry.config_entries.retain(|id| id != config_entry_id);
                if entry.primary_config_entry.as_deref() == Some(config_entry_id) {
                    entry.primary_config_entry = entry.config_entries.first().cloned();
                }
            });
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Snapshot of all devices
    pub fn iter(&self) -> Vec<Arc<DeviceEntry>> {
        self.by_id.iter().map(|r| Arc::clone(r.value())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry() -> (TempDir, DeviceRegistry) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(temp_dir.path()));
        (temp_dir, DeviceRegistry::new(storage))
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac("AA:BB:CC:DD:EE:FF"), "aa:bb:cc:dd:ee:ff");
        assert_eq!(format_mac("AA-BB-CC-DD-EE-FF"), "aa:bb:cc:dd:ee:ff");
        assert_eq!(format_mac("aabb.ccdd.eeff"), "aa:bb:cc:dd:ee:ff");
        assert_eq!(format_mac("AABBCCDDEEFF"), "aa:bb:cc:dd:ee:ff");
        assert_eq!(format_mac("not-a-mac"), "not-a-mac");
    }

    #[test]
    fn test_get_or_create_merges_by_connection() {
        let (_dir, registry) = registry();

        let bare = registry.get_or_create(
            "entry1",
            &DeviceInfo {
                connections: vec![DeviceConnection::mac("AA:BB:CC:DD:EE:FF")],
                ..Default::default()
            },
        );
        assert!(bare.name.is_none());

        let named = registry.get_or_create(
            "entry1",
            &DeviceInfo {
                connections: vec![DeviceConnection::mac("aa-bb-cc-dd-ee-ff")],
                name: Some("Pentair DD-EE-FF".to_string()),
                manufacturer: Some("Pentair".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(named.id, bare.id);
        assert_eq!(named.display_name(), "Pentair DD-EE-FF");
        assert_eq!(named.manufacturer.as_deref(), Some("Pentair"));
        assert_eq!(named.config_entries, vec!["entry1".to_string()]);
        assert_eq!(registry.len(), 1);
        assert!(registry
            .get_by_connection(CONNECTION_NETWORK_MAC, "AABBCCDDEEFF")
            .is_some());
    }

    #[test]
    fn test_clear_config_entry() {
        let (_dir, registry) = registry();
        let info = DeviceInfo {
            identifiers: vec![DeviceIdentifier::new("screenlogic", "gw1")],
            ..Default::default()
        };
        let shared = registry.get_or_create("entry1", &info);
        registry.get_or_create("entry2", &info);
        let solo = registry.get_or_create(
            "entry1",
            &DeviceInfo {
                identifiers: vec![DeviceIdentifier::new("screenlogic", "gw2")],
                ..Default::default()
            },
        );

        registry.clear_config_entry("entry1");

        assert!(registry.get(&solo.id).is_none());
        let shared = registry.get(&shared.id).unwrap();
        assert_eq!(shared.config_entries, vec!["entry2".to_string()]);
        assert_eq!(shared.primary_config_entry.as_deref(), Some("entry2"));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(temp_dir.path()));

        let registry = DeviceRegistry::new(storage.clone());
        let device = registry.get_or_create(
            "entry1",
            &DeviceInfo {
                connections: vec![DeviceConnection::mac("AA:BB:CC:DD:EE:FF")],
                model: Some("EasyTouch2 8".to_string()),
                ..Default::default()
            },
        );
        registry.save().await.unwrap();

        let loaded = DeviceRegistry::new(storage);
        loaded.load().await.unwrap();
        let restored = loaded
            .get_by_connection(CONNECTION_NETWORK_MAC, "aa:bb:cc:dd:ee:ff")
            .unwrap();
        assert_eq!(restored.id, device.id);
        assert_eq!(restored.model.as_deref(), Some("EasyTouch2 8"));
        assert_eq!(loaded.get_by_config_entry_id("entry1").len(), 1);
    }
}
