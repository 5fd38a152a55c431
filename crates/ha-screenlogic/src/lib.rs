//! Pentair ScreenLogic integration
//!
//! Exposes the equipment reported by a ScreenLogic pool controller gateway
//! as sensor and binary sensor entities.
//!
//! # Key Types
//!
//! - [`ScreenLogic`] - The [`Integration`](ha_config_entries::Integration) registered with config entries
//! - [`ScreenLogicGateway`] - Connection to a gateway, implemented outside this crate
//! - [`ScreenLogicCoordinator`] - Owns the gateway and refreshes its data
//! - [`realize_path_template`] - Resolves a data path relative to another
//!
//! Entity descriptions whose data point the gateway doesn't report are not
//! created, and any registry entry left over from an earlier setup is
//! removed.

pub mod binary_sensor;
pub mod config;
pub mod consts;
pub mod coordinator;
pub mod data;
pub mod discovery;
pub mod entity;
pub mod gateway;
pub mod integration;
pub mod keys;
pub mod migration;
pub mod sensor;
pub mod util;

pub use config::{ConfigError, ScreenLogicConfig};
pub use consts::DOMAIN;
pub use coordinator::{ScreenLogicCoordinator, UpdateFailed};
pub use data::{
    realize_path_template, DataPathError, PathPart, PathSegment, PathTemplate,
    ScreenLogicDataPath, TemplatePart,
};
pub use discovery::{DiscoveredGateway, GatewayDiscovery, NoDiscovery};
pub use entity::{ScreenLogicEntity, ScreenLogicEntityDescription};
pub use gateway::{
    ConnectionInfo, EquipmentFlags, GatewayData, GatewayError, GatewayFactory, PumpType,
    ScreenLogicGateway,
};
pub use integration::{ScreenLogic, ScreenLogicRuntime, PLATFORMS};
pub use util::{
    cleanup_excluded_entity, cleanup_stale_entities, generate_unique_id, get_ha_unit,
};
