//! Data update coordinator
//!
//! Owns the gateway connection, refreshes its data and keeps a snapshot the
//! entities read from.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::gateway::{ConnectionInfo, GatewayData, GatewayError, ScreenLogicGateway};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Error fetching ScreenLogic data: {0}")]
pub struct UpdateFailed(#[from] pub GatewayError);

pub struct ScreenLogicCoordinator {
    gateway: Mutex<Box<dyn ScreenLogicGateway>>,
    connect_info: ConnectionInfo,
    update_interval: Duration,
    name: String,
    mac: String,
    data: RwLock<Arc<GatewayData>>,
    last_update_success: AtomicBool,
    poll_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ScreenLogicCoordinator {
    /// Wrap a connected gateway
    pub fn new(
        gateway: Box<dyn ScreenLogicGateway>,
        connect_info: ConnectionInfo,
        update_interval: Duration,
    ) -> Self {
        let name = gateway.name().to_string();
        let mac = gateway.mac().to_string();
        let data = Arc::new(gateway.data().clone());

        Self {
            gateway: Mutex::new(gateway),
            connect_info,
            update_interval,
            name,
            mac,
            data: RwLock::new(data),
            last_update_success: AtomicBool::new(true),
            poll_task: std::sync::Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Snapshot of the data from the last successful refresh
    pub fn data(&self) -> Arc<GatewayData> {
        self.data
            .read()
            .map(|data| Arc::clone(&data))
            .unwrap_or_default()
    }

    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::Relaxed)
    }

    /// Fetch fresh data, reconnecting first if the connection was lost
    pub async fn refresh(&self) -> Result<(), UpdateFailed> {
        let result = self.fetch().await;
        self.last_update_success
            .store(result.is_ok(), Ordering::Relaxed);
        if let Err(ref e) = result {
            warn!("{}: {}", self.name, e);
        }
        result
    }

    async fn fetch(&self) -> Result<(), UpdateFailed> {
        let mut gateway = self.gateway.lock().await;

        if !gateway.is_connected() {
            debug!("Reconnecting to {}", self.name);
            gateway.async_connect(&self.connect_info).await?;
        }

        if let Err(e) = gateway.async_update().await {
            if gateway.is_connected() {
                let _ = gateway.async_disconnect().await;
            }
            return Err(e.into());
        }

        let snapshot = Arc::new(gateway.data().clone());
        if let Ok(mut data) = self.data.write() {
            *data = snapshot;
        }
        Ok(())
    }

    /// Refresh periodically until [`stop_polling`](Self::stop_polling)
    pub fn start_polling(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let interval = self.update_interval;

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };
                let _ = coordinator.refresh().await;
            }
        });

        if let Ok(mut task) = self.poll_task.lock() {
            if let Some(previous) = task.replace(handle) {
                previous.abort();
            }
        }
    }

    pub fn stop_polling(&self) {
        if let Ok(mut task) = self.poll_task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .map(|task| task.is_some())
            .unwrap_or(false)
    }

    /// Stop polling and close the gateway connection
    pub async fn shutdown(&self) {
        self.stop_polling();

        let mut gateway = self.gateway.lock().await;
        if gateway.is_connected() {
            if let Err(e) = gateway.async_disconnect().await {
                warn!("Error disconnecting from {}: {}", self.name, e);
            }
        }
    }
}

impl Drop for ScreenLogicCoordinator {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
