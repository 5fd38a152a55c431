//! Integration setup contract
//!
//! An integration registers with [`ConfigEntries`](crate::ConfigEntries) and
//! is called to set up and unload each of its config entries.

use async_trait::async_trait;
use thiserror::Error;

use crate::entry::ConfigEntry;

/// Why an integration could not set up an entry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The device or service is temporarily unavailable; setup is retried
    #[error("Config entry not ready: {0}")]
    NotReady(String),

    /// Setup failed and will not be retried automatically
    #[error("Config entry setup failed: {0}")]
    Failed(String),
}

/// An integration that manages config entries for one domain
#[async_trait]
pub trait Integration: Send + Sync {
    /// Domain handled by this integration (e.g., "screenlogic")
    fn domain(&self) -> &str;

    /// Set up a config entry
    async fn async_setup_entry(&self, entry: &ConfigEntry) -> Result<(), SetupError>;

    /// Unload a config entry; returning false marks the unload as failed
    async fn async_unload_entry(&self, entry: &ConfigEntry) -> bool;
}
