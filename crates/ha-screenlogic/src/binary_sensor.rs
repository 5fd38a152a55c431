//! Binary sensor platform

use std::sync::Arc;

use ha_core::Platform;
use ha_registries::EntityCategory;

use crate::entity::{PlatformContext, ScreenLogicEntity, ScreenLogicEntityDescription as Desc};
use crate::gateway::EquipmentFlags;
use crate::keys::{device, group, value};

fn core_binary_sensors() -> Vec<Desc> {
    vec![
        Desc::new(device::CONTROLLER, group::SENSOR, value::ACTIVE_ALERT).device_class("problem"),
        Desc::new(device::CONTROLLER, group::SENSOR, value::FREEZE_MODE)
            .entity_category(EntityCategory::Diagnostic),
        Desc::new(device::CONTROLLER, group::SENSOR, value::CLEANER_DELAY)
            .entity_category(EntityCategory::Diagnostic),
        Desc::new(device::CONTROLLER, group::SENSOR, value::POOL_DELAY)
            .entity_category(EntityCategory::Diagnostic),
        Desc::new(device::CONTROLLER, group::SENSOR, value::SPA_DELAY)
            .entity_category(EntityCategory::Diagnostic),
    ]
}

fn intellichem_binary_sensors() -> Vec<Desc> {
    [
        value::FLOW_ALARM,
        value::ORP_HIGH_ALARM,
        value::ORP_LOW_ALARM,
        value::ORP_SUPPLY_ALARM,
        value::PH_HIGH_ALARM,
        value::PH_LOW_ALARM,
        value::PH_SUPPLY_ALARM,
        value::PROBE_FAULT_ALARM,
    ]
    .into_iter()
    .map(|key| {
        Desc::new(device::INTELLICHEM, group::ALARM, key)
            .device_class("problem")
            .requires(EquipmentFlags::INTELLICHEM)
    })
    .collect()
}

pub fn descriptions() -> Vec<Desc> {
    let mut descriptions = core_binary_sensors();
    descriptions.extend(intellichem_binary_sensors());
    descriptions
}

pub async fn async_setup_entry(ctx: &PlatformContext<'_>) -> Vec<Arc<ScreenLogicEntity>> {
    ctx.add_entities(Platform::BinarySensor, descriptions())
}
