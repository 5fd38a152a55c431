//! Config Entries Manager
//!
//! Manages the lifecycle of configuration entries.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use ha_registries::{Storable, Storage, StorageResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::entry::{ConfigEntry, ConfigEntryState, ConfigEntryUpdate};
use crate::integration::{Integration, SetupError};
use crate::state_machine::{retry_delay, InvalidTransition};

/// Storage key for config entries
pub const STORAGE_KEY: &str = "core.config_entries";
/// Current storage version
pub const STORAGE_VERSION: u32 = 1;
/// Current minor version
pub const STORAGE_MINOR_VERSION: u32 = 5;

/// Config entries errors
#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists for domain {domain} with unique_id {unique_id}")]
    AlreadyExists { domain: String, unique_id: String },

    #[error("Cannot unload entry in state {0:?}")]
    CannotUnload(ConfigEntryState),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Storage error: {0}")]
    Storage(#[from] ha_registries::StorageError),
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

/// Config entries data for storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigEntriesData {
    pub entries: Vec<ConfigEntry>,
}

impl Storable for ConfigEntriesData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Config Entries Manager
///
/// Manages the lifecycle of configuration entries including:
/// - Loading/saving from storage
/// - Entry creation and removal
/// - Setup, retry and unload through the domain's [`Integration`]
pub struct ConfigEntries {
    storage: Arc<Storage>,

    /// Primary index: entry_id -> ConfigEntry
    entries: DashMap<String, ConfigEntry>,

    /// Index: domain -> set of entry_ids
    by_domain: DashMap<String, HashSet<String>>,

    /// Index: (domain, unique_id) -> entry_id
    by_unique_id: DashMap<(String, String), String>,

    /// Serializes setup/unload
    setup_lock: Mutex<()>,

    /// Integrations by domain
    integrations: DashMap<String, Arc<dyn Integration>>,

    /// Pending setup retries by entry_id
    retry_tasks: DashMap<String, JoinHandle<()>>,
}

impl ConfigEntries {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            entries: DashMap::new(),
            by_domain: DashMap::new(),
            by_unique_id: DashMap::new(),
            setup_lock: Mutex::new(()),
            integrations: DashMap::new(),
            retry_tasks: DashMap::new(),
        }
    }

    /// Load entries from storage
    pub async fn load(&self) -> StorageResult<()> {
        if let Some(data) = self.storage.load::<ConfigEntriesData>().await? {
            info!("Loading {} config entries from storage", data.entries.len());
            for entry in data.entries {
                self.index_entry(&entry);
            }
        }
        Ok(())
    }

    /// Save entries to storage
    pub async fn save(&self) -> StorageResult<()> {
        let data = ConfigEntriesData {
            entries: self.iter().collect(),
        };
        self.storage.save(&data).await?;
        debug!("Saved {} config entries to storage", data.entries.len());
        Ok(())
    }

    fn index_entry(&self, entry: &ConfigEntry) {
        let entry_id = entry.entry_id.clone();

        self.entries.insert(entry_id.clone(), entry.clone());

        self.by_domain
            .entry(entry.domain.clone())
            .or_default()
            .insert(entry_id.clone());

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .insert((entry.domain.clone(), unique_id.clone()), entry_id);
        }
    }

    fn unindex_entry(&self, entry: &ConfigEntry) {
        if let Some(mut ids) = self.by_domain.get_mut(&entry.domain) {
            ids.remove(&entry.entry_id);
        }
        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .remove(&(entry.domain.clone(), unique_id.clone()));
        }
        self.entries.remove(&entry.entry_id);
    }

    /// Get an entry by ID
    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|r| r.value().clone())
    }

    /// Get all entries for a domain
    pub fn get_by_domain(&self, domain: &str) -> Vec<ConfigEntry> {
        self.by_domain
            .get(domain)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get entry by unique_id
    pub fn get_by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        let entry_id = self
            .by_unique_id
            .get(&(domain.to_string(), unique_id.to_string()))
            .map(|r| r.value().clone())?;
        self.get(&entry_id)
    }

    /// Add a new config entry
    pub async fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        if let Some(ref unique_id) = entry.unique_id {
            if self.get_by_unique_id(&entry.domain, unique_id).is_some() {
                return Err(ConfigEntriesError::AlreadyExists {
                    domain: entry.domain.clone(),
                    unique_id: unique_id.clone(),
                });
            }
        }

        self.index_entry(&entry);
        self.save().await?;

        info!(
            "Added config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry.entry_id
        );
        Ok(entry)
    }

    /// Update an existing entry
    pub async fn update(
        &self,
        entry_id: &str,
        update: ConfigEntryUpdate,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        self.unindex_entry(&entry);

        let mut updated = entry;
        if let Some(title) = update.title {
            updated.title = title;
        }
        if let Some(data) = update.data {
            updated.data = data;
        }
        if let Some(options) = update.options {
            updated.options = options;
        }
        if let Some(unique_id) = update.unique_id {
            updated.unique_id = unique_id;
        }
        if let Some(pref) = update.pref_disable_polling {
            updated.pref_disable_polling = pref;
        }
        updated.modified_at = Utc::now();

        self.index_entry(&updated);
        self.save().await?;

        debug!("Updated config entry: {}", entry_id);
        Ok(updated)
    }

    /// Remove an entry, unloading it first if loaded
    pub async fn remove(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if entry.state != ConfigEntryState::NotLoaded {
            self.unload(entry_id).await?;
        }

        self.unindex_entry(&entry);
        self.save().await?;

        info!(
            "Removed config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry_id
        );
        Ok(entry)
    }

    /// Transition an entry's state through the lifecycle FSM
    fn set_state(
        &self,
        entry_id: &str,
        state: ConfigEntryState,
        reason: Option<String>,
    ) -> ConfigEntriesResult<()> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        entry.try_set_state(state, reason)?;
        debug!("Entry {} state changed to {:?}", entry_id, state);
        Ok(())
    }

    fn increment_tries(&self, entry_id: &str) -> u32 {
        self.entries
            .get_mut(entry_id)
            .map(|mut entry| {
                entry.tries += 1;
                entry.tries
            })
            .unwrap_or(0)
    }

    /// Register the integration that handles a domain
    pub fn register_integration(&self, integration: Arc<dyn Integration>) {
        let domain = integration.domain().to_string();
        debug!("Registered integration for domain: {}", domain);
        self.integrations.insert(domain, integration);
    }

    /// Set up an entry
    ///
    /// Returns true if the entry ended up loaded. An integration reporting
    /// [`SetupError::NotReady`] leaves the entry in `SetupRetry` and a
    /// background retry is scheduled with exponential backoff. A retry that
    /// is still pending for the entry is cancelled first.
    pub async fn setup(self: &Arc<Self>, entry_id: &str) -> ConfigEntriesResult<bool> {
        let lock = self.setup_lock.lock().await;
        self.cancel_retry(entry_id);

        let state = self.run_setup(&lock, entry_id).await?;
        if state == ConfigEntryState::SetupRetry {
            self.schedule_retry(&lock, entry_id);
        }
        Ok(state == ConfigEntryState::Loaded)
    }

    async fn run_setup(
        &self,
        _lock: &MutexGuard<'_, ()>,
        entry_id: &str,
    ) -> ConfigEntriesResult<ConfigEntryState> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if entry.is_disabled() {
            debug!("Skipping setup for disabled entry: {}", entry_id);
            return Ok(entry.state);
        }

        self.set_state(entry_id, ConfigEntryState::SetupInProgress, None)?;

        let integration = self
            .integrations
            .get(&entry.domain)
            .map(|r| Arc::clone(r.value()));
        let Some(integration) = integration else {
            debug!(
                "No integration for domain {}, marking as loaded",
                entry.domain
            );
            self.set_state(entry_id, ConfigEntryState::Loaded, None)?;
            return Ok(ConfigEntryState::Loaded);
        };

        let (state, reason) = match integration.async_setup_entry(&entry).await {
            Ok(()) => {
                info!("Setup completed for entry: {} ({})", entry.title, entry_id);
                (ConfigEntryState::Loaded, None)
            }
            Err(SetupError::NotReady(reason)) => {
                warn!("Config entry '{}' not ready yet: {}", entry.title, reason);
                (ConfigEntryState::SetupRetry, Some(reason))
            }
            Err(SetupError::Failed(reason)) => {
                warn!("Setup failed for entry {}: {}", entry_id, reason);
                (ConfigEntryState::SetupError, Some(reason))
            }
        };

        self.set_state(entry_id, state, reason)?;
        Ok(state)
    }

    /// Spawn the retry loop of an entry
    ///
    /// `retry_tasks` is only touched while `setup_lock` is held, so a retry
    /// that gets cancelled is always sleeping or waiting for the lock, never
    /// halfway through a setup.
    fn schedule_retry(self: &Arc<Self>, _lock: &MutexGuard<'_, ()>, entry_id: &str) {
        let this = Arc::clone(self);
        let id = entry_id.to_string();

        let handle = tokio::spawn(async move {
            loop {
                let delay = retry_delay(this.increment_tries(&id).saturating_sub(1));
                debug!("Retrying setup of {} in {:?}", id, delay);
                tokio::time::sleep(delay).await;

                let lock = this.setup_lock.lock().await;
                match this.run_setup(&lock, &id).await {
                    Ok(ConfigEntryState::SetupRetry) => continue,
                    Ok(_) => {}
                    Err(e) => warn!("Setup retry for {} aborted: {}", id, e),
                }
                this.retry_tasks.remove(&id);
                break;
            }
        });

        if let Some(previous) = self.retry_tasks.insert(entry_id.to_string(), handle) {
            previous.abort();
        }
    }

    fn cancel_retry(&self, entry_id: &str) {
        if let Some((_, retry)) = self.retry_tasks.remove(entry_id) {
            debug!("Cancelling pending setup retry of {}", entry_id);
            retry.abort();
        }
    }

    /// Unload an entry
    ///
    /// Returns false if the integration failed to unload; the entry is then
    /// left in `FailedUnload`.
    pub async fn unload(&self, entry_id: &str) -> ConfigEntriesResult<bool> {
        let _lock = self.setup_lock.lock().await;
        self.cancel_retry(entry_id);

        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if !entry.state.is_recoverable() {
            return Err(ConfigEntriesError::CannotUnload(entry.state));
        }
        if entry.state == ConfigEntryState::NotLoaded {
            return Ok(true);
        }

        self.set_state(entry_id, ConfigEntryState::UnloadInProgress, None)?;

        let integration = self
            .integrations
            .get(&entry.domain)
            .map(|r| Arc::clone(r.value()));
        let unloaded = match integration {
            Some(integration) if entry.state == ConfigEntryState::Loaded => {
                integration.async_unload_entry(&entry).await
            }
            _ => true,
        };

        if unloaded {
            self.set_state(entry_id, ConfigEntryState::NotLoaded, None)?;
            info!("Unloaded entry: {} ({})", entry.title, entry_id);
        } else {
            self.set_state(
                entry_id,
                ConfigEntryState::FailedUnload,
                Some("Unload failed".to_string()),
            )?;
            warn!("Failed to unload entry: {} ({})", entry.title, entry_id);
        }
        Ok(unloaded)
    }

    /// Reload an entry (unload + setup)
    pub async fn reload(self: &Arc<Self>, entry_id: &str) -> ConfigEntriesResult<bool> {
        if !self.unload(entry_id).await? {
            return Ok(false);
        }
        self.setup(entry_id).await
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ConfigEntry> + '_ {
        self.entries.iter().map(|r| r.value().clone())
    }

    /// Setup all entries
    pub async fn setup_all(self: &Arc<Self>) -> Vec<ConfigEntriesResult<bool>> {
        let mut results = Vec::new();
        for entry_id in self.entry_ids() {
            results.push(self.setup(&entry_id).await);
        }
        results
    }
}
