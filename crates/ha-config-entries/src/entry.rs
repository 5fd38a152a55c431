//! Config Entry types
//!
//! A ConfigEntry represents a single instance of an integration's configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state_machine::InvalidTransition;

/// Where a config entry is in its setup/unload lifecycle
///
/// Only `Loaded`, `SetupError`, `SetupRetry` and `NotLoaded` can be unloaded
/// or reloaded; the `*InProgress` states are transient and the remaining
/// failures need a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntryState {
    #[default]
    NotLoaded,
    SetupInProgress,
    Loaded,
    SetupError,
    /// Integration reported not ready; a retry is scheduled
    SetupRetry,
    MigrationError,
    UnloadInProgress,
    FailedUnload,
}

impl ConfigEntryState {
    pub fn is_recoverable(&self) -> bool {
        use ConfigEntryState::*;
        matches!(self, Loaded | SetupError | SetupRetry | NotLoaded)
    }
}

/// How the entry was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntrySource {
    #[default]
    User,
    Import,
    Discovery,
    /// Found through a DHCP lease for a known MAC prefix
    Dhcp,
    Ignore,
    Reauth,
    Reconfigure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntryDisabledBy {
    User,
}

/// A configuration entry for an integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Unique identifier (ULID)
    pub entry_id: String,

    /// Integration domain (e.g., "screenlogic")
    pub domain: String,

    /// Human-readable display name
    pub title: String,

    /// Immutable configuration data
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,

    /// User-configurable options
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,

    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_version")]
    pub minor_version: u32,

    /// Optional unique identifier for duplicate prevention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    #[serde(default)]
    pub source: ConfigEntrySource,

    /// Current lifecycle state (not persisted)
    #[serde(skip, default)]
    pub state: ConfigEntryState,

    /// Human-readable explanation for failed states
    #[serde(skip, default)]
    pub reason: Option<String>,

    /// Number of setup retry attempts (not persisted)
    #[serde(skip, default)]
    pub tries: u32,

    /// Disable background polling
    #[serde(default)]
    pub pref_disable_polling: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<ConfigEntryDisabledBy>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl ConfigEntry {
    /// Create a new config entry
    pub fn new(domain: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            entry_id: ulid::Ulid::new().to_string(),
            domain: domain.into(),
            title: title.into(),
            data: HashMap::new(),
            options: HashMap::new(),
            version: 1,
            minor_version: 1,
            unique_id: None,
            source: ConfigEntrySource::User,
            state: ConfigEntryState::NotLoaded,
            reason: None,
            tries: 0,
            pref_disable_polling: false,
            disabled_by: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Set entry data
    pub fn with_data(mut self, data: HashMap<String, serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    /// Set a single data value
    pub fn with_data_value(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Set a single option value
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    pub fn with_source(mut self, source: ConfigEntrySource) -> Self {
        self.source = source;
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.state == ConfigEntryState::Loaded
    }

    /// Transition to a new state, validated against the lifecycle FSM
    pub fn try_set_state(
        &mut self,
        new_state: ConfigEntryState,
        reason: Option<String>,
    ) -> Result<(), InvalidTransition> {
        self.state = self.state.try_transition(new_state)?;
        self.reason = reason;

        if !matches!(
            new_state,
            ConfigEntryState::SetupRetry | ConfigEntryState::SetupInProgress
        ) {
            self.tries = 0;
        }
        Ok(())
    }
}

/// Update data for a config entry
#[derive(Debug, Default)]
pub struct ConfigEntryUpdate {
    pub title: Option<String>,
    pub data: Option<HashMap<String, serde_json::Value>>,
    pub options: Option<HashMap<String, serde_json::Value>>,
    pub unique_id: Option<Option<String>>,
    pub pref_disable_polling: Option<bool>,
}

impl ConfigEntryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn data(mut self, data: HashMap<String, serde_json::Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn options(mut self, options: HashMap<String, serde_json::Value>) -> Self {
        self.options = Some(options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_entry_builder() {
        let entry = ConfigEntry::new("screenlogic", "Pentair DD-EE-FF")
            .with_data_value("ip_address", json!("127.0.0.1"))
            .with_option("scan_interval", json!(30))
            .with_unique_id("aa:bb:cc:dd:ee:ff")
            .with_source(ConfigEntrySource::Dhcp);

        assert_eq!(entry.domain, "screenlogic");
        assert_eq!(entry.state, ConfigEntryState::NotLoaded);
        assert_eq!(entry.unique_id.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(entry.data.get("ip_address"), Some(&json!("127.0.0.1")));
        assert_eq!(entry.options.get("scan_interval"), Some(&json!(30)));
        assert!(!entry.entry_id.is_empty());
    }

    #[test]
    fn test_try_set_state_resets_tries() {
        let mut entry = ConfigEntry::new("screenlogic", "Test");
        entry.try_set_state(ConfigEntryState::SetupInProgress, None).unwrap();
        entry.try_set_state(ConfigEntryState::SetupRetry, Some("offline".into())).unwrap();
        entry.tries = 2;
        entry.try_set_state(ConfigEntryState::SetupInProgress, None).unwrap();
        assert_eq!(entry.tries, 2);
        entry.try_set_state(ConfigEntryState::Loaded, None).unwrap();
        assert_eq!(entry.tries, 0);
        assert!(entry.reason.is_none());

        assert!(entry.try_set_state(ConfigEntryState::SetupInProgress, None).is_err());
        assert_eq!(entry.state, ConfigEntryState::Loaded);
    }

    #[test]
    fn test_serde_skips_runtime_state() {
        let mut entry = ConfigEntry::new("screenlogic", "Test").with_unique_id("mac");
        entry.state = ConfigEntryState::Loaded;

        let json = serde_json::to_string(&entry).unwrap();
        let parsed: ConfigEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.unique_id.as_deref(), Some("mac"));
        assert_eq!(parsed.state, ConfigEntryState::NotLoaded);
    }
}
