//! Keys of the gateway data tree
//!
//! The tree is addressed as `device -> group or index -> data key`, with
//! each data point carrying the attributes in [`attr`].

pub mod device {
    pub const ADAPTER: &str = "adapter";
    pub const CIRCUIT: &str = "circuit";
    pub const CONTROLLER: &str = "controller";
    pub const INTELLICHEM: &str = "intellichem";
    pub const PUMP: &str = "pump";
    pub const SCG: &str = "scg";
}

pub mod group {
    pub const ALARM: &str = "alarm";
    pub const CONFIGURATION: &str = "configuration";
    pub const EQUIPMENT: &str = "equipment";
    pub const SENSOR: &str = "sensor";
}

pub mod value {
    pub const ACTIVE_ALERT: &str = "active_alert";
    pub const AIR_TEMPERATURE: &str = "air_temperature";
    pub const CALCIUM_HARDNESS: &str = "calcium_hardness";
    pub const CLEANER_DELAY: &str = "cleaner_delay";
    pub const CYA: &str = "cya";
    pub const DATA: &str = "data";
    pub const FIRMWARE: &str = "firmware";
    pub const FLAGS: &str = "flags";
    pub const FLOW_ALARM: &str = "flow_alarm";
    pub const FREEZE_MODE: &str = "freeze_mode";
    pub const GPM_NOW: &str = "gpm_now";
    pub const MODEL: &str = "model";
    pub const ORP_HIGH_ALARM: &str = "orp_high_alarm";
    pub const ORP_LOW_ALARM: &str = "orp_low_alarm";
    pub const ORP_NOW: &str = "orp_now";
    pub const ORP_SETPOINT: &str = "orp_setpoint";
    pub const ORP_SUPPLY_ALARM: &str = "orp_supply_alarm";
    pub const ORP_SUPPLY_LEVEL: &str = "orp_supply_level";
    pub const PH_HIGH_ALARM: &str = "ph_high_alarm";
    pub const PH_LOW_ALARM: &str = "ph_low_alarm";
    pub const PH_NOW: &str = "ph_now";
    pub const PH_SETPOINT: &str = "ph_setpoint";
    pub const PH_SUPPLY_ALARM: &str = "ph_supply_alarm";
    pub const PH_SUPPLY_LEVEL: &str = "ph_supply_level";
    pub const POOL_SETPOINT: &str = "pool_setpoint";
    pub const POOL_DELAY: &str = "pool_delay";
    pub const PROBE_FAULT_ALARM: &str = "probe_fault_alarm";
    pub const RPM_NOW: &str = "rpm_now";
    pub const SALT_PPM: &str = "salt_ppm";
    pub const SALT_TDS_PPM: &str = "salt_tds_ppm";
    pub const SATURATION: &str = "saturation";
    pub const SPA_DELAY: &str = "spa_delay";
    pub const SPA_SETPOINT: &str = "spa_setpoint";
    pub const STATE: &str = "state";
    pub const SUPER_CHLOR_TIMER: &str = "super_chlor_timer";
    pub const TOTAL_ALKALINITY: &str = "total_alkalinity";
    pub const TYPE: &str = "type";
    pub const WATTS_NOW: &str = "watts_now";
}

pub mod attr {
    pub const NAME: &str = "name";
    pub const NAME_INDEX: &str = "name_index";
    pub const UNIT: &str = "unit";
    pub const VALUE: &str = "value";
}
