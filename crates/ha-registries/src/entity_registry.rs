//! Entity Registry
//!
//! Tracks all registered entities keyed by `(domain, platform, unique_id)`,
//! with device and config entry indexes and soft deletion.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ha_core::EntityId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{Storable, Storage, StorageResult};

/// Errors that can occur in the entity registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityRegistryError {
    /// Entity was not found
    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Storage key for entity registry
pub const STORAGE_KEY: &str = "core.entity_registry";
/// Current storage version
pub const STORAGE_VERSION: u32 = 1;
/// Days a soft-deleted entity is kept before `save` purges it
pub const DELETED_ENTITY_RETENTION_DAYS: i64 = 30;
/// Current minor version
pub const STORAGE_MINOR_VERSION: u32 = 19;

/// (domain, platform, unique_id)
type RegistryKey = (String, String, String);

/// Reason an entity was disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledBy {
    ConfigEntry,
    Device,
    Hass,
    Integration,
    User,
}

/// Reason an entity was hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenBy {
    Integration,
    User,
}

/// Entity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

/// A registered entity entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEntry {
    /// Internal ID
    pub id: String,
    /// Full entity ID (domain.object_id)
    pub entity_id: String,
    /// Platform-specific unique identifier
    pub unique_id: String,
    /// Unique identifier before the last migration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_unique_id: Option<String>,
    /// Integration that provides this entity
    pub platform: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_entry_id: Option<String>,

    /// User-set name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Platform default name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// If true, the friendly name is prefixed with the device name
    #[serde(default)]
    pub has_entity_name: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<EntityCategory>,
    /// User-set device class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    /// Platform default device class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_device_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<DisabledBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_by: Option<HiddenBy>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl EntityEntry {
    /// Get the domain from entity_id
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map(|(domain, _)| domain)
            .unwrap_or(&self.entity_id)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }

    fn key(&self) -> RegistryKey {
        (
            self.domain().to_string(),
            self.platform.clone(),
            self.unique_id.clone(),
        )
    }
}

/// Everything a platform provides when registering an entity
#[derive(Debug, Clone, Default)]
pub struct EntityRegistration {
    pub domain: String,
    pub platform: String,
    pub unique_id: String,
    /// Free-form name the entity_id is derived from
    pub suggested_object_id: Option<String>,
    pub config_entry_id: Option<String>,
    pub device_id: Option<String>,
    pub disabled_by: Option<DisabledBy>,
    pub has_entity_name: bool,
    pub original_name: Option<String>,
    pub entity_category: Option<EntityCategory>,
    pub original_device_class: Option<String>,
    pub unit_of_measurement: Option<String>,
}

impl EntityRegistration {
    pub fn new(
        domain: impl Into<String>,
        platform: impl Into<String>,
        unique_id: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            platform: platform.into(),
            unique_id: unique_id.into(),
            ..Default::default()
        }
    }

    pub fn suggested_object_id(mut self, suggested: impl Into<String>) -> Self {
        self.suggested_object_id = Some(suggested.into());
        self
    }

    pub fn config_entry_id(mut self, config_entry_id: impl Into<String>) -> Self {
        self.config_entry_id = Some(config_entry_id.into());
        self
    }

    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    pub fn has_entity_name(mut self, has_entity_name: bool) -> Self {
        self.has_entity_name = has_entity_name;
        self
    }

    pub fn disabled_by(mut self, disabled_by: Option<DisabledBy>) -> Self {
        self.disabled_by = disabled_by;
        self
    }

    pub fn entity_category(mut self, category: Option<EntityCategory>) -> Self {
        self.entity_category = category;
        self
    }

    pub fn original_device_class(mut self, device_class: Option<String>) -> Self {
        self.original_device_class = device_class;
        self
    }

    pub fn unit_of_measurement(mut self, unit: Option<String>) -> Self {
        self.unit_of_measurement = unit;
        self
    }

    /// Copy the platform-provided fields onto an entry
    fn apply_to(&self, entry: &mut EntityEntry) {
        entry.config_entry_id = self.config_entry_id.clone();
        entry.device_id = self.device_id.clone();
        entry.has_entity_name = self.has_entity_name;
        entry.original_name = self.original_name.clone();
        entry.entity_category = self.entity_category;
        entry.original_device_class = self.original_device_class.clone();
        entry.unit_of_measurement = self.unit_of_measurement.clone();
    }
}

/// A unique_id (and optionally entity_id) rewrite produced by a migration callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMigration {
    pub new_unique_id: String,
    pub new_entity_id: Option<String>,
}

/// Entity registry data for storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRegistryData {
    pub entities: Vec<EntityEntry>,
    #[serde(default)]
    pub deleted_entities: Vec<EntityEntry>,
}

impl Storable for EntityRegistryData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Entity Registry with multi-index support
///
/// Entries are stored as `Arc<EntityEntry>` to avoid cloning on reads.
pub struct EntityRegistry {
    storage: Arc<Storage>,

    /// Primary index: entity_id -> EntityEntry, in insertion order
    by_entity_id: RwLock<IndexMap<String, Arc<EntityEntry>>>,

    /// Index: (domain, platform, unique_id) -> entity_id
    by_key: DashMap<RegistryKey, String>,

    /// Index: device_id -> set of entity_ids
    by_device_id: DashMap<String, HashSet<String>>,

    /// Index: config_entry_id -> set of entity_ids
    by_config_entry_id: DashMap<String, HashSet<String>>,

    /// Soft-deleted entities, restored when the same key registers again
    deleted: RwLock<IndexMap<RegistryKey, Arc<EntityEntry>>>,
}

impl EntityRegistry {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            by_entity_id: RwLock::new(IndexMap::new()),
            by_key: DashMap::new(),
            by_device_id: DashMap::new(),
            by_config_entry_id: DashMap::new(),
            deleted: RwLock::new(IndexMap::new()),
        }
    }

    /// Load from storage
    pub async fn load(&self) -> StorageResult<()> {
        if let Some(data) = self.storage.load::<EntityRegistryData>().await? {
            info!("Loading {} entities from storage", data.entities.len());

            for entry in data.entities {
                self.index_entry(Arc::new(entry));
            }
            if let Ok(mut deleted) = self.deleted.write() {
                for entry in data.deleted_entities {
                    deleted.insert(entry.key(), Arc::new(entry));
                }
            }
        }
        Ok(())
    }

    /// Save to storage, purging deleted entities past their retention
    pub async fn save(&self) -> StorageResult<()> {
        self.purge_deleted(Utc::now() - chrono::Duration::days(DELETED_ENTITY_RETENTION_DAYS));

        let data = EntityRegistryData {
            entities: self.iter().iter().map(|e| (**e).clone()).collect(),
            deleted_entities: self.deleted_iter().iter().map(|e| (**e).clone()).collect(),
        };
        self.storage.save(&data).await?;
        debug!("Saved {} entities to storage", data.entities.len());
        Ok(())
    }

    fn index_entry(&self, entry: Arc<EntityEntry>) {
        let entity_id = entry.entity_id.clone();

        self.by_key.insert(entry.key(), entity_id.clone());

        if let Some(ref device_id) = entry.device_id {
            self.by_device_id
                .entry(device_id.clone())
                .or_default()
                .insert(entity_id.clone());
        }
        if let Some(ref config_entry_id) = entry.config_entry_id {
            self.by_config_entry_id
                .entry(config_entry_id.clone())
                .or_default()
                .insert(entity_id.clone());
        }

        if let Ok(mut idx) = self.by_entity_id.write() {
            idx.insert(entity_id, entry);
        }
    }

    /// Remove an entry from the secondary indexes
    fn unindex_entry(&self, entry: &EntityEntry) {
        self.by_key.remove(&entry.key());

        if let Some(ref device_id) = entry.device_id {
            if let Some(mut ids) = self.by_device_id.get_mut(device_id) {
                ids.remove(&entry.entity_id);
            }
        }
        if let Some(ref config_entry_id) = entry.config_entry_id {
            if let Some(mut ids) = self.by_config_entry_id.get_mut(config_entry_id) {
                ids.remove(&entry.entity_id);
            }
        }
    }

    /// Get entity by entity_id
    pub fn get(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        self.by_entity_id
            .read()
            .ok()
            .and_then(|idx| idx.get(entity_id).cloned())
    }

    /// Look up the entity_id registered for `(domain, platform, unique_id)`
    pub fn get_entity_id(&self, domain: &str, platform: &str, unique_id: &str) -> Option<String> {
        self.by_key
            .get(&(
                domain.to_string(),
                platform.to_string(),
                unique_id.to_string(),
            ))
            .map(|r| r.value().clone())
    }

    pub fn get_by_device_id(&self, device_id: &str) -> Vec<Arc<EntityEntry>> {
        self.by_device_id
            .get(device_id)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn get_by_config_entry_id(&self, config_entry_id: &str) -> Vec<Arc<EntityEntry>> {
        self.by_config_entry_id
            .get(config_entry_id)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get or create an entity entry
    ///
    /// An existing entry with the same `(domain, platform, unique_id)` gets
    /// its platform-provided fields refreshed. A soft-deleted entry with that
    /// key is restored (keeping its internal id and creation time). Otherwise
    /// a new entry is created with an entity_id derived from the suggestion.
    pub fn get_or_create(&self, registration: EntityRegistration) -> Arc<EntityEntry> {
        let key: RegistryKey = (
            registration.domain.clone(),
            registration.platform.clone(),
            registration.unique_id.clone(),
        );

        let existing_id = self.by_key.get(&key).map(|r| r.value().clone());
        if let Some(entity_id) = existing_id {
            if let Ok(updated) = self.update(&entity_id, |entry| registration.apply_to(entry)) {
                return updated;
            }
        }

        let suggested = registration
            .suggested_object_id
            .clone()
            .unwrap_or_else(|| format!("{} {}", registration.platform, registration.unique_id));
        let entity_id = self.generate_entity_id(&registration.domain, &suggested);
        let now = Utc::now();

        let restored = self
            .deleted
            .write()
            .ok()
            .and_then(|mut d| d.shift_remove(&key));

        let mut entry = match restored {
            Some(deleted_entry) => {
                info!("Restoring deleted entity: {}", entity_id);
                let mut entry = (*deleted_entry).clone();
                entry.entity_id = entity_id;
                entry.modified_at = now;
                entry
            }
            None => {
                info!("Registered new entity: {}", entity_id);
                EntityEntry {
                    id: ulid::Ulid::new().to_string().to_lowercase(),
                    entity_id,
                    unique_id: registration.unique_id.clone(),
                    previous_unique_id: None,
                    platform: registration.platform.clone(),
                    device_id: None,
                    config_entry_id: None,
                    name: None,
                    original_name: None,
                    has_entity_name: false,
                    entity_category: None,
                    device_class: None,
                    original_device_class: None,
                    unit_of_measurement: None,
                    disabled_by: registration.disabled_by,
                    hidden_by: None,
                    created_at: now,
                    modified_at: now,
                }
            }
        };
        registration.apply_to(&mut entry);

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        entry
    }

    /// Update an entity entry
    ///
    /// The closure may change the entity_id or unique_id; indexes follow.
    pub fn update<F>(&self, entity_id: &str, f: F) -> Result<Arc<EntityEntry>, EntityRegistryError>
    where
        F: FnOnce(&mut EntityEntry),
    {
        let current = self
            .by_entity_id
            .write()
            .ok()
            .and_then(|mut idx| idx.shift_remove(entity_id))
            .ok_or_else(|| EntityRegistryError::NotFound(entity_id.to_string()))?;

        self.unindex_entry(&current);

        let mut entry = (*current).clone();
        f(&mut entry);
        if entry != *current {
            entry.modified_at = Utc::now();
        }

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        Ok(entry)
    }

    /// Remove an entity
    ///
    /// The entry is kept in the deleted set so a later registration with
    /// the same key restores it.
    pub fn remove(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        let entry = self
            .by_entity_id
            .write()
            .ok()
            .and_then(|mut idx| idx.shift_remove(entity_id))?;

        self.unindex_entry(&entry);
        if let Ok(mut deleted) = self.deleted.write() {
            let mut deleted_entry = (*entry).clone();
            deleted_entry.modified_at = Utc::now();
            deleted.insert(entry.key(), Arc::new(deleted_entry));
        }
        info!("Removed entity: {}", entity_id);
        Some(entry)
    }

    /// Forget soft-deleted entities removed before `cutoff`
    pub fn purge_deleted(&self, cutoff: DateTime<Utc>) -> usize {
        let Ok(mut deleted) = self.deleted.write() else {
            return 0;
        };
        let before = deleted.len();
        deleted.retain(|_, entry| entry.modified_at >= cutoff);

        let purged = before - deleted.len();
        if purged > 0 {
            debug!("Purged {} deleted entities", purged);
        }
        purged
    }

    /// Rewrite unique_ids (and optionally entity_ids) of a config entry's entities
    ///
    /// Migrations whose target unique_id or entity_id is already taken are
    /// skipped. Returns the number of migrated entries.
    pub fn migrate_entries<F>(&self, config_entry_id: &str, migrate: F) -> usize
    where
        F: Fn(&EntityEntry) -> Option<EntityMigration>,
    {
        let mut migrated = 0;

        for entry in self.get_by_config_entry_id(config_entry_id) {
            let Some(migration) = migrate(entry.as_ref()) else {
                continue;
            };

            if let Some(existing) =
                self.get_entity_id(entry.domain(), &entry.platform, &migration.new_unique_id)
            {
                warn!(
                    "Cannot migrate {} to unique_id '{}', already used by {}",
                    entry.entity_id, migration.new_unique_id, existing
                );
                continue;
            }

            let new_entity_id = migration
                .new_entity_id
                .filter(|id| !self.is_registered(id));

            let old_unique_id = entry.unique_id.clone();
            let result = self.update(&entry.entity_id, |e| {
                e.previous_unique_id = Some(old_unique_id.clone());
                e.unique_id = migration.new_unique_id.clone();
                if let Some(new_entity_id) = new_entity_id {
                    e.entity_id = new_entity_id;
                }
            });

            if let Ok(updated) = result {
                debug!(
                    "Migrated {} unique_id '{}' -> '{}'",
                    updated.entity_id, old_unique_id, updated.unique_id
                );
                migrated += 1;
            }
        }

        migrated
    }

    pub fn len(&self) -> usize {
        self.by_entity_id.read().map(|idx| idx.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_registered(&self, entity_id: &str) -> bool {
        self.by_entity_id
            .read()
            .map(|idx| idx.contains_key(entity_id))
            .unwrap_or(false)
    }

    /// Generate an entity_id that doesn't conflict with existing registrations
    ///
    /// Slugifies the suggestion; if taken, appends `_2`, `_3`, ... until free.
    pub fn generate_entity_id(&self, domain: &str, suggested_object_id: &str) -> String {
        let base = match EntityId::from_suggestion(domain, suggested_object_id) {
            Ok(id) => id,
            Err(e) => {
                warn!("Invalid entity_id suggestion {domain}.{suggested_object_id}: {e}");
                return format!("{}.{}", domain, ha_core::slugify(suggested_object_id));
            }
        };

        let preferred = base.to_string();
        if !self.is_registered(&preferred) {
            return preferred;
        }

        (2..u32::MAX)
            .map(|n| base.with_suffix(n).to_string())
            .find(|candidate| !self.is_registered(candidate))
            .unwrap_or(preferred)
    }

    /// All entities in insertion order
    ///
    /// Returns a Vec to avoid holding the lock during iteration.
    pub fn iter(&self) -> Vec<Arc<EntityEntry>> {
        self.by_entity_id
            .read()
            .map(|idx| idx.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn deleted_iter(&self) -> Vec<Arc<EntityEntry>> {
        self.deleted
            .read()
            .map(|d| d.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if `(domain, platform, unique_id)` is in the deleted set
    pub fn is_deleted(&self, domain: &str, platform: &str, unique_id: &str) -> bool {
        let key = (
            domain.to_string(),
            platform.to_string(),
            unique_id.to_string(),
        );
        self.deleted
            .read()
            .map(|d| d.contains_key(&key))
            .unwrap_or(false)
    }
}
