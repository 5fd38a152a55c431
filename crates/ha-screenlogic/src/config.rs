//! Config entry data and options

use std::collections::HashMap;
use std::time::Duration;

use ha_config_entries::ConfigEntry;
use ha_registries::format_mac;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::consts::{DEFAULT_PORT, DEFAULT_SCAN_INTERVAL, MIN_SCAN_INTERVAL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config entry has no gateway MAC address")]
    MissingMac,

    #[error("Invalid config entry {section}: {source}")]
    Invalid {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct EntryData {
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
struct EntryOptions {
    /// Seconds between polls
    #[serde(default = "default_scan_interval")]
    scan_interval: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}

/// Settings of one configured gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLogicConfig {
    /// Gateway MAC, the config entry's unique id
    pub mac: String,
    /// Static address, used when discovery doesn't find the gateway
    pub ip_address: Option<String>,
    pub port: u16,
    pub scan_interval: Duration,
}

impl ScreenLogicConfig {
    pub fn from_entry(entry: &ConfigEntry) -> Result<Self, ConfigError> {
        let mac = entry
            .unique_id
            .as_deref()
            .filter(|mac| !mac.is_empty())
            .map(format_mac)
            .ok_or(ConfigError::MissingMac)?;

        let data: EntryData = parse_section("data", &entry.data)?;
        let options: EntryOptions = parse_section("options", &entry.options)?;

        let mut scan_interval = Duration::from_secs(options.scan_interval);
        if scan_interval < MIN_SCAN_INTERVAL {
            warn!(
                "Scan interval {:?} for {} is below the minimum, using {:?}",
                scan_interval, entry.title, MIN_SCAN_INTERVAL
            );
            scan_interval = MIN_SCAN_INTERVAL;
        }

        Ok(Self {
            mac,
            ip_address: data.ip_address.filter(|ip| !ip.is_empty()),
            port: data.port,
            scan_interval,
        })
    }
}

fn parse_section<T: DeserializeOwned>(
    section: &'static str,
    values: &HashMap<String, Value>,
) -> Result<T, ConfigError> {
    let object = Value::Object(values.clone().into_iter().collect());
    serde_json::from_value(object).map_err(|source| ConfigError::Invalid { section, source })
}

/// Display name derived from a MAC, e.g. `Pentair: DD-EE-FF`
pub fn name_for_mac(mac: &str) -> String {
    let tail: Vec<&str> = mac.rsplit(':').take(3).collect();
    let short = tail
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase();
    format!("Pentair: {short}")
}
