//! Config entry setup and unload

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use ha_config_entries::{ConfigEntry, Integration, SetupError};
use ha_core::Platform;
use ha_registries::{DeviceConnection, DeviceInfo, Registries};
use tracing::{debug, info, warn};

use crate::binary_sensor;
use crate::config::ScreenLogicConfig;
use crate::consts::{DOMAIN, MANUFACTURER};
use crate::coordinator::ScreenLogicCoordinator;
use crate::discovery::{async_get_connect_info, GatewayDiscovery};
use crate::entity::{PlatformContext, ScreenLogicEntity};
use crate::gateway::GatewayFactory;
use crate::migration::async_migrate_entries;
use crate::sensor;
use crate::util::cleanup_stale_entities;

/// Platforms the integration sets up entities on
pub const PLATFORMS: &[Platform] = &[Platform::BinarySensor, Platform::Sensor];

/// Everything a loaded config entry keeps alive
pub struct ScreenLogicRuntime {
    pub coordinator: Arc<ScreenLogicCoordinator>,
    pub device_id: String,
    pub entities: Vec<Arc<ScreenLogicEntity>>,
}

impl ScreenLogicRuntime {
    pub fn entity(&self, entity_id: &str) -> Option<&Arc<ScreenLogicEntity>> {
        self.entities.iter().find(|e| e.entity_id == entity_id)
    }
}

/// The ScreenLogic integration
pub struct ScreenLogic {
    registries: Arc<Registries>,
    discovery: Arc<dyn GatewayDiscovery>,
    gateway_factory: GatewayFactory,
    runtime: DashMap<String, Arc<ScreenLogicRuntime>>,
}

impl ScreenLogic {
    pub fn new(
        registries: Arc<Registries>,
        discovery: Arc<dyn GatewayDiscovery>,
        gateway_factory: GatewayFactory,
    ) -> Self {
        Self {
            registries,
            discovery,
            gateway_factory,
            runtime: DashMap::new(),
        }
    }

    /// Runtime data of a loaded entry
    pub fn runtime_data(&self, entry_id: &str) -> Option<Arc<ScreenLogicRuntime>> {
        self.runtime.get(entry_id).map(|r| Arc::clone(r.value()))
    }

    async fn setup(&self, entry: &ConfigEntry) -> Result<ScreenLogicRuntime, SetupError> {
        let config =
            ScreenLogicConfig::from_entry(entry).map_err(|e| SetupError::Failed(e.to_string()))?;

        let migrated = async_migrate_entries(&self.registries.entities, &entry.entry_id);
        if migrated > 0 {
            info!("Migrated {} legacy entities for {}", migrated, entry.title);
        }

        let connect_info = async_get_connect_info(self.discovery.as_ref(), &config)
            .await
            .ok_or_else(|| {
                SetupError::NotReady(format!("Unable to locate gateway {}", config.mac))
            })?;

        let mut gateway = (self.gateway_factory)();
        gateway
            .async_connect(&connect_info)
            .await
            .map_err(|e| SetupError::NotReady(e.to_string()))?;

        let coordinator = Arc::new(ScreenLogicCoordinator::new(
            gateway,
            connect_info,
            config.scan_interval,
        ));
        if let Err(e) = coordinator.refresh().await {
            coordinator.shutdown().await;
            return Err(SetupError::NotReady(e.to_string()));
        }

        let data = coordinator.data();
        let device = self.registries.devices.get_or_create(
            &entry.entry_id,
            &DeviceInfo {
                connections: vec![DeviceConnection::mac(coordinator.mac())],
                name: Some(coordinator.name().to_string()),
                manufacturer: Some(MANUFACTURER.to_string()),
                model: data.controller_model().map(String::from),
                sw_version: data.firmware_version().map(String::from),
                ..Default::default()
            },
        );

        let ctx = PlatformContext {
            config_entry_id: &entry.entry_id,
            device_id: &device.id,
            coordinator: &coordinator,
            entity_registry: &self.registries.entities,
        };
        let (sensors, binary_sensors) = futures::join!(
            sensor::async_setup_entry(&ctx),
            binary_sensor::async_setup_entry(&ctx)
        );
        debug!(
            "Set up {} sensors and {} binary sensors for {}",
            sensors.len(),
            binary_sensors.len(),
            entry.title
        );

        let current: HashSet<_> = sensors
            .iter()
            .chain(&binary_sensors)
            .map(|e| (e.platform, e.unique_id.clone()))
            .collect();
        let stale = cleanup_stale_entities(
            &self.registries.entities,
            &entry.entry_id,
            PLATFORMS,
            &current,
        );
        if stale > 0 {
            info!("Removed {} stale entities for {}", stale, entry.title);
        }

        if let Err(e) = self.registries.save_all().await {
            warn!("Failed to save registries: {}", e);
        }

        if !entry.pref_disable_polling {
            coordinator.start_polling();
        }

        let mut entities = sensors;
        entities.extend(binary_sensors);

        Ok(ScreenLogicRuntime {
            coordinator,
            device_id: device.id.clone(),
            entities,
        })
    }
}

#[async_trait]
impl Integration for ScreenLogic {
    fn domain(&self) -> &str {
        DOMAIN
    }

    async fn async_setup_entry(&self, entry: &ConfigEntry) -> Result<(), SetupError> {
        let runtime = self.setup(entry).await?;
        self.runtime
            .insert(entry.entry_id.clone(), Arc::new(runtime));
        Ok(())
    }

    async fn async_unload_entry(&self, entry: &ConfigEntry) -> bool {
        if let Some((_, runtime)) = self.runtime.remove(&entry.entry_id) {
            runtime.coordinator.shutdown().await;
        }
        true
    }
}
