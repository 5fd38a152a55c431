//! Shared helpers for the ScreenLogic platforms

use std::collections::HashSet;

use ha_core::Platform;
use ha_registries::EntityRegistry;
use tracing::debug;

use crate::consts::DOMAIN;
use crate::data::{PathSegment, ScreenLogicDataPath};

/// Unique id suffix for a data point
///
/// Indexed equipment (pumps, circuits, bodies) gets `device_index_key`;
/// everything else is unique by its data key alone.
pub fn generate_unique_id(
    device: &PathSegment,
    group: Option<&PathSegment>,
    data_key: &PathSegment,
) -> String {
    let numeric_group = match group {
        Some(PathSegment::Index(_)) => true,
        Some(PathSegment::Key(key)) => !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    };

    match group {
        Some(group) if numeric_group => format!("{device}_{group}_{data_key}"),
        _ => data_key.to_string(),
    }
}

/// Full entity unique id for a `(device, group, data key)` data path
pub fn entity_unique_id(mac: &str, data_path: &ScreenLogicDataPath) -> Option<String> {
    let (device, group, data_key) = data_path.parts()?;
    Some(format!(
        "{mac}_{}",
        generate_unique_id(device, Some(group), data_key)
    ))
}

/// Map a ScreenLogic unit string onto the unit used for the entity
pub fn get_ha_unit(sl_unit: Option<&str>) -> Option<String> {
    let unit = match sl_unit? {
        "" => return None,
        "gpm" => "gal/min",
        "lsi" => return None,
        other => other,
    };
    Some(unit.to_string())
}

/// Remove the registry entry of a data point the gateway no longer reports
///
/// Returns true if an entity was removed.
pub fn cleanup_excluded_entity(
    registry: &EntityRegistry,
    platform: Platform,
    mac: &str,
    data_path: &ScreenLogicDataPath,
) -> bool {
    let Some(unique_id) = entity_unique_id(mac, data_path) else {
        return false;
    };

    match registry.get_entity_id(platform.as_str(), DOMAIN, &unique_id) {
        Some(entity_id) => {
            debug!(
                "Removing existing entity '{}' per data inclusion rule",
                entity_id
            );
            registry.remove(&entity_id).is_some()
        }
        None => false,
    }
}

/// Remove a config entry's entities that the last setup did not register
///
/// Catches data points that vanished along with their equipment, such as a
/// pump index the gateway stopped reporting, which no description covers.
/// `current` holds `(platform, unique_id)` of every entity just set up.
pub fn cleanup_stale_entities(
    registry: &EntityRegistry,
    config_entry_id: &str,
    platforms: &[Platform],
    current: &HashSet<(Platform, String)>,
) -> usize {
    let mut removed = 0;

    for entry in registry.get_by_config_entry_id(config_entry_id) {
        if entry.platform != DOMAIN {
            continue;
        }
        let Some(platform) = platforms
            .iter()
            .copied()
            .find(|p| p.as_str() == entry.domain())
        else {
            continue;
        };
        if current.contains(&(platform, entry.unique_id.clone())) {
            continue;
        }

        debug!(
            "Removing existing entity '{}', data point no longer reported",
            entry.entity_id
        );
        if registry.remove(&entry.entity_id).is_some() {
            removed += 1;
        }
    }

    removed
}
