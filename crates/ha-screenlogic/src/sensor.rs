//! Sensor platform

use std::sync::Arc;

use ha_core::Platform;
use ha_registries::EntityCategory;

use crate::data::PathPart;
use crate::entity::{PlatformContext, ScreenLogicEntity, ScreenLogicEntityDescription as Desc};
use crate::gateway::{EquipmentFlags, GatewayData, PumpType};
use crate::keys::{device, group, value};
use crate::path_template;

fn core_sensors() -> Vec<Desc> {
    vec![
        Desc::new(device::CONTROLLER, group::SENSOR, value::AIR_TEMPERATURE)
            .device_class("temperature"),
    ]
}

fn pump_sensors(data: &GatewayData) -> Vec<Desc> {
    let mut descriptions = Vec::new();

    for index in data.indexes(device::PUMP) {
        let is_vs = data.pump_type(index) == Some(PumpType::IntelliFloVs);
        let included = || path_template!(PathPart::Device, PathPart::Index, value::DATA);

        descriptions.push(
            Desc::new(device::PUMP, index, value::WATTS_NOW)
                .device_class("power")
                .included_when(included()),
        );
        descriptions.push(Desc::new(device::PUMP, index, value::RPM_NOW).included_when(included()));
        descriptions.push(
            Desc::new(device::PUMP, index, value::GPM_NOW)
                .included_when(included())
                .excluded_if(is_vs)
                .disabled_by_default(),
        );
    }

    descriptions
}

fn intellichem_sensors() -> Vec<Desc> {
    let sensor = |group: &str, key: &str| {
        Desc::new(device::INTELLICHEM, group, key).requires(EquipmentFlags::INTELLICHEM)
    };

    vec![
        sensor(group::SENSOR, value::ORP_NOW),
        sensor(group::SENSOR, value::PH_NOW).device_class("ph"),
        sensor(group::SENSOR, value::ORP_SUPPLY_LEVEL),
        sensor(group::SENSOR, value::PH_SUPPLY_LEVEL),
        sensor(group::SENSOR, value::SATURATION),
        sensor(group::CONFIGURATION, value::ORP_SETPOINT)
            .entity_category(EntityCategory::Diagnostic),
        sensor(group::CONFIGURATION, value::PH_SETPOINT)
            .entity_category(EntityCategory::Diagnostic),
        sensor(group::CONFIGURATION, value::CALCIUM_HARDNESS)
            .entity_category(EntityCategory::Diagnostic),
        sensor(group::CONFIGURATION, value::CYA).entity_category(EntityCategory::Diagnostic),
        sensor(group::CONFIGURATION, value::TOTAL_ALKALINITY)
            .entity_category(EntityCategory::Diagnostic),
        sensor(group::CONFIGURATION, value::SALT_TDS_PPM)
            .entity_category(EntityCategory::Diagnostic),
    ]
}

fn scg_sensors() -> Vec<Desc> {
    vec![
        Desc::new(device::SCG, group::SENSOR, value::SALT_PPM)
            .requires(EquipmentFlags::CHLORINATOR),
        Desc::new(device::SCG, group::CONFIGURATION, value::SUPER_CHLOR_TIMER)
            .requires(EquipmentFlags::CHLORINATOR)
            .entity_category(EntityCategory::Diagnostic),
    ]
}

/// All sensor descriptions for the equipment in `data`
pub fn descriptions(data: &GatewayData) -> Vec<Desc> {
    let mut descriptions = core_sensors();
    descriptions.extend(pump_sensors(data));
    descriptions.extend(intellichem_sensors());
    descriptions.extend(scg_sensors());
    descriptions
}

pub async fn async_setup_entry(ctx: &PlatformContext<'_>) -> Vec<Arc<ScreenLogicEntity>> {
    let descriptions = descriptions(&ctx.coordinator.data());
    ctx.add_entities(Platform::Sensor, descriptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_path;
    use serde_json::json;

    #[test]
    fn test_vs_pump_has_no_flow_sensor() {
        let data = GatewayData::new(json!({
            "pump": {
                "0": {"data": 70, "type": 2, "gpm_now": {"value": 0}, "watts_now": {"value": 100}},
                "1": {"data": 0, "type": 0}
            }
        }));

        let reported: Vec<_> = descriptions(&data)
            .into_iter()
            .filter(|d| d.is_reported(&data))
            .map(|d| d.data_path)
            .collect();

        assert_eq!(reported, vec![data_path!(device::PUMP, 0_u32, value::WATTS_NOW)]);
    }

    #[test]
    fn test_intellichem_requires_flag() {
        let chem = json!({"sensor": {"saturation": {"name": "Saturation Index", "value": 0.06}}});
        let without = GatewayData::new(json!({"intellichem": chem}));
        let with = GatewayData::new(json!({
            "controller": {"equipment": {"flags": 0x8000}},
            "intellichem": chem
        }));

        let saturation = intellichem_sensors()
            .into_iter()
            .find(|d| d.data_path == data_path!(device::INTELLICHEM, group::SENSOR, value::SATURATION))
            .unwrap();

        assert!(!saturation.is_reported(&without));
        assert!(saturation.is_reported(&with));
    }
}
