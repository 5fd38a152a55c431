//! Core types for Home Assistant
//!
//! This crate provides the small shared vocabulary used by the registries,
//! config entries and integrations: entity IDs, entity platform domains and
//! the slug helper used to derive object IDs from display names.

mod entity_id;
mod platform;
mod util;

pub use entity_id::{EntityId, EntityIdError};
pub use platform::{Platform, UnknownPlatform};
pub use util::slugify;

/// Network MAC connection type used for device connections
pub const CONNECTION_NETWORK_MAC: &str = "mac";
