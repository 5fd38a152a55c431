//! Mock gateway and discovery

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ha_screenlogic::{
    ConnectionInfo, DiscoveredGateway, GatewayData, GatewayDiscovery, GatewayError,
    GatewayFactory, ScreenLogicGateway,
};
use serde_json::Value;

use super::fixtures::{MOCK_ADAPTER_MAC, MOCK_ADAPTER_NAME};

/// Shared view of every gateway a factory created
#[derive(Default)]
pub struct GatewayCalls {
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub updates: AtomicUsize,
    /// When set, connecting fails as if the gateway were unreachable
    pub unreachable: AtomicBool,
    /// Data served by the next update
    pub data: Mutex<Value>,
    pub last_connect: Mutex<Option<ConnectionInfo>>,
}

impl GatewayCalls {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_data(&self, data: Value) {
        *self.data.lock().unwrap() = data;
    }
}

/// Serves whatever data the shared [`GatewayCalls`] holds
pub struct MockGateway {
    calls: Arc<GatewayCalls>,
    connected: bool,
    data: GatewayData,
}

#[async_trait]
impl ScreenLogicGateway for MockGateway {
    async fn async_connect(&mut self, info: &ConnectionInfo) -> Result<(), GatewayError> {
        self.calls.connects.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_connect.lock().unwrap() = Some(info.clone());

        if self.calls.unreachable.load(Ordering::SeqCst) {
            return Err(GatewayError::Connection {
                host: info.ip_address.clone(),
                port: info.port,
                reason: "connection refused".to_string(),
            });
        }

        self.connected = true;
        self.data = GatewayData::new(self.calls.data.lock().unwrap().clone());
        Ok(())
    }

    async fn async_disconnect(&mut self) -> Result<(), GatewayError> {
        self.calls.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected = false;
        Ok(())
    }

    async fn async_update(&mut self) -> Result<(), GatewayError> {
        self.calls.updates.fetch_add(1, Ordering::SeqCst);
        if !self.connected {
            return Err(GatewayError::NotConnected);
        }
        self.data = GatewayData::new(self.calls.data.lock().unwrap().clone());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn name(&self) -> &str {
        MOCK_ADAPTER_NAME
    }

    fn mac(&self) -> &str {
        MOCK_ADAPTER_MAC
    }

    fn data(&self) -> &GatewayData {
        &self.data
    }
}

/// A factory of mock gateways serving `data`
pub fn mock_gateway_factory(data: Value) -> (GatewayFactory, Arc<GatewayCalls>) {
    let calls = Arc::new(GatewayCalls::default());
    calls.set_data(data);

    let shared = Arc::clone(&calls);
    let factory: GatewayFactory = Arc::new(move || {
        Box::new(MockGateway {
            calls: Arc::clone(&shared),
            connected: false,
            data: GatewayData::default(),
        }) as Box<dyn ScreenLogicGateway>
    });
    (factory, calls)
}

/// Discovery answering with a fixed set of gateways
#[derive(Default)]
pub struct MockDiscovery(pub Vec<DiscoveredGateway>);

#[async_trait]
impl GatewayDiscovery for MockDiscovery {
    async fn async_discover(&self) -> Vec<DiscoveredGateway> {
        self.0.clone()
    }
}
