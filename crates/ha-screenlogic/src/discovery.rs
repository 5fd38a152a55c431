//! Gateway discovery
//!
//! Gateways announce themselves on the local network. Rediscovering one by
//! MAC on every setup follows DHCP address changes; the address stored in
//! the config entry is the fallback.

use std::collections::HashMap;

use async_trait::async_trait;
use ha_registries::format_mac;
use tracing::debug;

use crate::config::{name_for_mac, ScreenLogicConfig};
use crate::gateway::ConnectionInfo;

/// A gateway that answered discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredGateway {
    pub mac: String,
    pub ip_address: String,
    pub port: u16,
    pub gateway_type: u32,
    pub gateway_subtype: u32,
    pub name: String,
}

impl From<DiscoveredGateway> for ConnectionInfo {
    fn from(gateway: DiscoveredGateway) -> Self {
        ConnectionInfo {
            ip_address: gateway.ip_address,
            port: gateway.port,
            gateway_type: Some(gateway.gateway_type),
            gateway_subtype: Some(gateway.gateway_subtype),
            name: Some(gateway.name),
        }
    }
}

#[async_trait]
pub trait GatewayDiscovery: Send + Sync {
    async fn async_discover(&self) -> Vec<DiscoveredGateway>;
}

/// Discovery for installations that only use static addresses
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiscovery;

#[async_trait]
impl GatewayDiscovery for NoDiscovery {
    async fn async_discover(&self) -> Vec<DiscoveredGateway> {
        Vec::new()
    }
}

/// Discovered gateways keyed by formatted MAC
pub async fn async_discover_gateways_by_unique_id(
    discovery: &dyn GatewayDiscovery,
) -> HashMap<String, DiscoveredGateway> {
    discovery
        .async_discover()
        .await
        .into_iter()
        .map(|gateway| (format_mac(&gateway.mac), gateway))
        .collect()
}

/// Resolve where to connect for a configured gateway
///
/// Returns `None` when the gateway was not discovered and the entry has no
/// static address.
pub async fn async_get_connect_info(
    discovery: &dyn GatewayDiscovery,
    config: &ScreenLogicConfig,
) -> Option<ConnectionInfo> {
    let mut discovered = async_discover_gateways_by_unique_id(discovery).await;
    if let Some(gateway) = discovered.remove(&config.mac) {
        debug!("Rediscovered gateway {} at {}", config.mac, gateway.ip_address);
        return Some(gateway.into());
    }

    debug!("Gateway rediscovery failed for {}", config.mac);
    let ip_address = config.ip_address.clone()?;
    Some(ConnectionInfo {
        name: Some(name_for_mac(&config.mac)),
        ..ConnectionInfo::new(ip_address, config.port)
    })
}
