//! Test harness
//!
//! Registries and config entries in a temporary directory, with the
//! ScreenLogic integration registered against a mock gateway.

use std::path::Path;
use std::sync::Arc;

use ha_config_entries::{ConfigEntries, ConfigEntry, ConfigEntrySource};
use ha_registries::Registries;
use ha_screenlogic::consts::{CONF_IP_ADDRESS, CONF_PORT, CONF_SCAN_INTERVAL};
use ha_screenlogic::{DiscoveredGateway, ScreenLogic, DOMAIN};
use serde_json::{json, Value};
use tempfile::TempDir;

use super::fixtures::{
    init_tracing, MOCK_ADAPTER_IP, MOCK_ADAPTER_MAC, MOCK_ADAPTER_NAME, MOCK_ADAPTER_PORT,
};
use super::mock_gateway::{mock_gateway_factory, GatewayCalls, MockDiscovery};

pub struct TestHarness {
    _dir: TempDir,
    pub registries: Arc<Registries>,
    pub config_entries: Arc<ConfigEntries>,
    pub integration: Arc<ScreenLogic>,
    pub gateway: Arc<GatewayCalls>,
}

impl TestHarness {
    /// Harness whose discovery finds nothing
    pub fn new(data: Value) -> Self {
        Self::with_discovery(data, Vec::new())
    }

    pub fn with_discovery(data: Value, discovered: Vec<DiscoveredGateway>) -> Self {
        init_tracing();

        let dir = TempDir::new().unwrap();
        let registries = Arc::new(Registries::new(dir.path()));
        let config_entries = Arc::new(ConfigEntries::new(registries.storage.clone()));

        let (factory, gateway) = mock_gateway_factory(data);
        let integration = Arc::new(ScreenLogic::new(
            registries.clone(),
            Arc::new(MockDiscovery(discovered)),
            factory,
        ));
        config_entries.register_integration(integration.clone());

        Self {
            _dir: dir,
            registries,
            config_entries,
            integration,
            gateway,
        }
    }

    /// Add the standard mock config entry
    pub async fn add_mock_config_entry(&self) -> ConfigEntry {
        self.config_entries
            .add(mock_config_entry())
            .await
            .unwrap()
    }

    pub fn config_dir(&self) -> &Path {
        self._dir.path()
    }

    pub fn entity_id(&self, platform: &str, unique_id: &str) -> Option<String> {
        self.registries
            .entities
            .get_entity_id(platform, DOMAIN, unique_id)
    }
}

/// Config entry for the mock gateway
pub fn mock_config_entry() -> ConfigEntry {
    ConfigEntry::new(DOMAIN, MOCK_ADAPTER_NAME)
        .with_unique_id(MOCK_ADAPTER_MAC)
        .with_source(ConfigEntrySource::User)
        .with_data_value(CONF_IP_ADDRESS, json!(MOCK_ADAPTER_IP))
        .with_data_value(CONF_PORT, json!(MOCK_ADAPTER_PORT))
        .with_option(CONF_SCAN_INTERVAL, json!(30))
}
