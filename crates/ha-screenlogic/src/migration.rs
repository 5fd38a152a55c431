//! Unique id migration for entities created by older releases
//!
//! Older releases used camelCase or `chem_` prefixed keys, with a `_N`
//! suffix for pump entities (`aa:bb:cc:dd:ee:ff_currentWatts_0`). They are
//! rewritten to the data keys of the gateway data tree.

use ha_core::slugify;
use ha_registries::{EntityEntry, EntityMigration, EntityRegistry};
use tracing::debug;

use crate::consts::DOMAIN;
use crate::data::PathSegment;
use crate::keys::{device, value};
use crate::util::generate_unique_id;

/// One legacy key and what it became
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyKey {
    pub old_key: &'static str,
    pub new_key: &'static str,
    /// Device of indexed entities
    pub device: Option<&'static str>,
    /// Old and new entity names, used to rewrite the entity_id
    pub rename: Option<(&'static str, &'static str)>,
}

const fn key(old_key: &'static str, new_key: &'static str) -> LegacyKey {
    LegacyKey {
        old_key,
        new_key,
        device: None,
        rename: None,
    }
}

const fn renamed(
    old_key: &'static str,
    new_key: &'static str,
    old_name: &'static str,
    new_name: &'static str,
) -> LegacyKey {
    LegacyKey {
        old_key,
        new_key,
        device: None,
        rename: Some((old_name, new_name)),
    }
}

const fn on_device(mut legacy: LegacyKey, device: &'static str) -> LegacyKey {
    legacy.device = Some(device);
    legacy
}

pub const ENTITY_MIGRATIONS: &[LegacyKey] = &[
    renamed("chem_alarm", value::ACTIVE_ALERT, "Chemistry Alarm", "Active Alert"),
    key("chem_calcium_harness", value::CALCIUM_HARDNESS),
    renamed("chem_current_orp", value::ORP_NOW, "Current ORP", "ORP"),
    renamed("chem_current_ph", value::PH_NOW, "Current pH", "pH"),
    key("chem_cya", value::CYA),
    key("chem_orp_setpoint", value::ORP_SETPOINT),
    key("chem_orp_supply_level", value::ORP_SUPPLY_LEVEL),
    key("chem_ph_setpoint", value::PH_SETPOINT),
    key("chem_ph_supply_level", value::PH_SUPPLY_LEVEL),
    key("chem_salt_tds_ppm", value::SALT_TDS_PPM),
    key("chem_total_alkalinity", value::TOTAL_ALKALINITY),
    on_device(
        renamed("currentGPM", value::GPM_NOW, "Current GPM", "Flow Rate"),
        device::PUMP,
    ),
    on_device(
        renamed("currentRPM", value::RPM_NOW, "Current RPM", "Speed"),
        device::PUMP,
    ),
    on_device(
        renamed("currentWatts", value::WATTS_NOW, "Current Watts", "Power"),
        device::PUMP,
    ),
    renamed("orp_alarm", value::ORP_LOW_ALARM, "ORP Alarm", "ORP LOW Alarm"),
    renamed("ph_alarm", value::PH_LOW_ALARM, "pH Alarm", "pH LOW Alarm"),
    key("scg_level1", value::POOL_SETPOINT),
    key("scg_level2", value::SPA_SETPOINT),
    key("scg_status", value::STATE),
    key("scg_super_chlor_timer", value::SUPER_CHLOR_TIMER),
];

fn lookup(old_key: &str) -> Option<&'static LegacyKey> {
    ENTITY_MIGRATIONS.iter().find(|m| m.old_key == old_key)
}

/// Compute the migration for one registry entry, if it has a legacy unique id
pub fn migrate_unique_id(entry: &EntityEntry) -> Option<EntityMigration> {
    if entry.platform != DOMAIN {
        return None;
    }

    // MACs contain no underscores, so the first one ends the MAC
    let (mac, source_key) = entry.unique_id.split_once('_')?;

    let (source_key, source_index) = match source_key.rsplit_once('_') {
        Some((key, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            (key, Some(index))
        }
        _ => (source_key, None),
    };

    let legacy = lookup(source_key)?;

    let suffix = match (legacy.device, source_index) {
        (Some(device), Some(index)) => generate_unique_id(
            &PathSegment::from(device),
            Some(&PathSegment::from(index)),
            &PathSegment::from(legacy.new_key),
        ),
        (Some(_), None) => return None,
        (None, _) => legacy.new_key.to_string(),
    };
    let new_unique_id = format!("{mac}_{suffix}");

    let new_entity_id = legacy.rename.and_then(|(old_name, new_name)| {
        let old_slug = slugify(old_name);
        let new_slug = slugify(new_name);
        (old_slug != new_slug && entry.entity_id.contains(&old_slug))
            .then(|| entry.entity_id.replace(&old_slug, &new_slug))
    });

    debug!(
        "Migrating unique_id {} to {} ({:?})",
        entry.unique_id, new_unique_id, new_entity_id
    );
    Some(EntityMigration {
        new_unique_id,
        new_entity_id,
    })
}

/// Migrate the legacy unique ids of a config entry's entities
pub fn async_migrate_entries(registry: &EntityRegistry, config_entry_id: &str) -> usize {
    registry.migrate_entries(config_entry_id, migrate_unique_id)
}
