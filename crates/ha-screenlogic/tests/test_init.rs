//! Config entry setup, unload, retry and migration

mod common;

use common::*;
use ha_config_entries::{ConfigEntry, ConfigEntryState};
use ha_registries::{DisabledBy, EntityRegistration, Registries};
use ha_screenlogic::consts::CONF_PORT;
use ha_screenlogic::{DiscoveredGateway, DOMAIN};
use serde_json::json;

#[tokio::test]
async fn test_setup_and_unload() {
    let harness = TestHarness::new(load_json_fixture(DATA_FULL));
    let entry = harness.add_mock_config_entry().await;

    assert!(harness.config_entries.setup(&entry.entry_id).await.unwrap());
    assert_eq!(
        harness.config_entries.get(&entry.entry_id).unwrap().state,
        ConfigEntryState::Loaded
    );

    let runtime = harness.integration.runtime_data(&entry.entry_id).unwrap();
    assert_eq!(runtime.entities.len(), 30);
    assert!(runtime.coordinator.is_polling());

    let air = runtime
        .entity("sensor.pentair_dd_ee_ff_air_temperature")
        .unwrap();
    assert_eq!(air.native_value(), Some(json!(69)));
    assert_eq!(air.unit_of_measurement.as_deref(), Some("°F"));
    assert!(air.available());

    let flow = runtime
        .entity("binary_sensor.pentair_dd_ee_ff_flow_alarm")
        .unwrap();
    assert_eq!(flow.is_on(), Some(true));

    let device = harness.registries.devices.get(&runtime.device_id).unwrap();
    assert_eq!(device.name.as_deref(), Some(MOCK_ADAPTER_NAME));
    assert_eq!(device.manufacturer.as_deref(), Some("Pentair"));
    assert_eq!(device.model.as_deref(), Some("EasyTouch2 8"));
    assert_eq!(device.sw_version.as_deref(), Some("POOL: 5.2 Build 736.0 Rel"));
    assert!(harness
        .registries
        .devices
        .get_by_connection("mac", MOCK_ADAPTER_MAC)
        .is_some());

    assert!(harness.config_entries.unload(&entry.entry_id).await.unwrap());
    assert_eq!(
        harness.config_entries.get(&entry.entry_id).unwrap().state,
        ConfigEntryState::NotLoaded
    );
    assert_eq!(harness.gateway.disconnects(), 1);
    assert!(!runtime.coordinator.is_polling());
    assert!(harness.integration.runtime_data(&entry.entry_id).is_none());
}

#[tokio::test]
async fn test_entities_disabled_by_default() {
    let harness = TestHarness::new(load_json_fixture(DATA_FULL));
    let entry = harness.add_mock_config_entry().await;
    assert!(harness.config_entries.setup(&entry.entry_id).await.unwrap());

    let gpm = harness
        .entity_id("sensor", &format!("{MOCK_ADAPTER_MAC}_pump_0_gpm_now"))
        .and_then(|id| harness.registries.entities.get(&id))
        .unwrap();
    assert_eq!(gpm.disabled_by, Some(DisabledBy::Integration));
    assert_eq!(gpm.unit_of_measurement.as_deref(), Some("gal/min"));

    let watts = harness
        .entity_id("sensor", &format!("{MOCK_ADAPTER_MAC}_pump_0_watts_now"))
        .and_then(|id| harness.registries.entities.get(&id))
        .unwrap();
    assert!(!watts.is_disabled());
    assert_eq!(watts.original_device_class.as_deref(), Some("power"));
}

#[tokio::test]
async fn test_setup_gateway_unreachable() {
    let harness = TestHarness::new(load_json_fixture(DATA_FULL));
    harness.gateway.set_unreachable(true);
    let entry = harness.add_mock_config_entry().await;

    assert!(!harness.config_entries.setup(&entry.entry_id).await.unwrap());

    let entry = harness.config_entries.get(&entry.entry_id).unwrap();
    assert_eq!(entry.state, ConfigEntryState::SetupRetry);
    assert!(entry
        .reason
        .as_deref()
        .is_some_and(|reason| reason.contains("connection refused")));
    assert!(harness.integration.runtime_data(&entry.entry_id).is_none());

    assert!(harness.config_entries.unload(&entry.entry_id).await.unwrap());
    assert_eq!(
        harness.config_entries.get(&entry.entry_id).unwrap().state,
        ConfigEntryState::NotLoaded
    );
}

#[tokio::test]
async fn test_setup_without_address() {
    let harness = TestHarness::new(load_json_fixture(DATA_FULL));
    let entry = harness
        .config_entries
        .add(ConfigEntry::new(DOMAIN, MOCK_ADAPTER_NAME).with_unique_id(MOCK_ADAPTER_MAC))
        .await
        .unwrap();

    assert!(!harness.config_entries.setup(&entry.entry_id).await.unwrap());
    assert_eq!(
        harness.config_entries.get(&entry.entry_id).unwrap().state,
        ConfigEntryState::SetupRetry
    );
    assert_eq!(harness.gateway.connects(), 0);

    harness.config_entries.unload(&entry.entry_id).await.unwrap();
}

#[tokio::test]
async fn test_setup_invalid_entry() {
    let harness = TestHarness::new(load_json_fixture(DATA_FULL));
    let entry = harness
        .config_entries
        .add(ConfigEntry::new(DOMAIN, MOCK_ADAPTER_NAME).with_data_value(CONF_PORT, json!("http")))
        .await
        .unwrap();

    assert!(!harness.config_entries.setup(&entry.entry_id).await.unwrap());
    assert_eq!(
        harness.config_entries.get(&entry.entry_id).unwrap().state,
        ConfigEntryState::SetupError
    );
}

#[tokio::test]
async fn test_discovered_address_is_preferred() {
    let harness = TestHarness::with_discovery(
        load_json_fixture(DATA_FULL),
        vec![DiscoveredGateway {
            mac: MOCK_ADAPTER_MAC.to_uppercase(),
            ip_address: "192.168.1.50".to_string(),
            port: 80,
            gateway_type: 2,
            gateway_subtype: 2,
            name: "Pentair: DD-EE-FF".to_string(),
        }],
    );
    let entry = harness.add_mock_config_entry().await;

    assert!(harness.config_entries.setup(&entry.entry_id).await.unwrap());

    let info = harness.gateway.last_connect.lock().unwrap().clone().unwrap();
    assert_eq!(info.ip_address, "192.168.1.50");
}

#[tokio::test]
async fn test_polling_disabled() {
    let harness = TestHarness::new(load_json_fixture(DATA_FULL));
    let mut entry = mock_config_entry();
    entry.pref_disable_polling = true;
    let entry = harness.config_entries.add(entry).await.unwrap();

    assert!(harness.config_entries.setup(&entry.entry_id).await.unwrap());
    let runtime = harness.integration.runtime_data(&entry.entry_id).unwrap();
    assert!(!runtime.coordinator.is_polling());
}

#[tokio::test]
async fn test_migrate_legacy_unique_ids() {
    let harness = TestHarness::new(load_json_fixture(DATA_FULL));
    let entry = harness.add_mock_config_entry().await;

    let legacy = harness.registries.entities.get_or_create(
        EntityRegistration::new("sensor", DOMAIN, format!("{MOCK_ADAPTER_MAC}_currentWatts_0"))
            .suggested_object_id(format!("{MOCK_ADAPTER_NAME} Pool Pump Current Watts"))
            .config_entry_id(&entry.entry_id),
    );
    assert_eq!(
        legacy.entity_id,
        "sensor.pentair_dd_ee_ff_pool_pump_current_watts"
    );

    let legacy_alarm = harness.registries.entities.get_or_create(
        EntityRegistration::new("binary_sensor", DOMAIN, format!("{MOCK_ADAPTER_MAC}_chem_alarm"))
            .suggested_object_id(format!("{MOCK_ADAPTER_NAME} Chemistry Alarm"))
            .config_entry_id(&entry.entry_id),
    );

    assert!(harness.config_entries.setup(&entry.entry_id).await.unwrap());

    let migrated = harness
        .entity_id("sensor", &format!("{MOCK_ADAPTER_MAC}_pump_0_watts_now"))
        .unwrap();
    assert_eq!(migrated, "sensor.pentair_dd_ee_ff_pool_pump_power");
    assert!(harness
        .entity_id("sensor", &format!("{MOCK_ADAPTER_MAC}_currentWatts_0"))
        .is_none());

    let entity = harness.registries.entities.get(&migrated).unwrap();
    assert_eq!(entity.id, legacy.id);
    assert_eq!(
        entity.previous_unique_id.as_deref(),
        Some(legacy.unique_id.as_str())
    );

    assert_eq!(
        harness
            .entity_id("binary_sensor", &format!("{MOCK_ADAPTER_MAC}_active_alert"))
            .as_deref(),
        Some("binary_sensor.pentair_dd_ee_ff_active_alert")
    );
    assert!(harness.registries.entities.get(&legacy_alarm.entity_id).is_none());
}

#[tokio::test]
async fn test_registries_persist() {
    let harness = TestHarness::new(load_json_fixture(DATA_FULL));
    let entry = harness.add_mock_config_entry().await;
    assert!(harness.config_entries.setup(&entry.entry_id).await.unwrap());

    let reloaded = Registries::new(harness.config_dir());
    reloaded.load_all().await.unwrap();

    assert_eq!(reloaded.entities.len(), harness.registries.entities.len());
    assert_eq!(reloaded.devices.len(), 1);
    assert!(reloaded
        .entities
        .get_entity_id("sensor", DOMAIN, &format!("{MOCK_ADAPTER_MAC}_air_temperature"))
        .is_some());
}
