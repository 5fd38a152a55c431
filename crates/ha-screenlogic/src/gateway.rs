//! Gateway seam
//!
//! The ScreenLogic protocol lives behind [`ScreenLogicGateway`]. The rest of
//! the integration only sees the [`GatewayData`] tree a connected gateway
//! reports.

use std::sync::Arc;

use async_trait::async_trait;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::data::{PathSegment, ScreenLogicDataPath};
use crate::keys::{attr, device, group, value};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Unable to connect to {host}:{port}: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Gateway is not connected")]
    NotConnected,

    #[error("Gateway update failed: {0}")]
    Update(String),
}

/// Where and how to reach a gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub ip_address: String,
    pub port: u16,
    #[serde(default)]
    pub gateway_type: Option<u32>,
    #[serde(default)]
    pub gateway_subtype: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ConnectionInfo {
    pub fn new(ip_address: impl Into<String>, port: u16) -> Self {
        Self {
            ip_address: ip_address.into(),
            port,
            gateway_type: None,
            gateway_subtype: None,
            name: None,
        }
    }
}

bitflags! {
    /// Optional equipment reported in `controller.equipment.flags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EquipmentFlags: u32 {
        const SOLAR = 0x1;
        const SOLAR_AS_HEAT_PUMP = 0x2;
        const CHLORINATOR = 0x4;
        const INTELLIBRITE = 0x8;
        const INTELLIFLO_0 = 0x10;
        const INTELLIFLO_1 = 0x20;
        const INTELLIFLO_2 = 0x40;
        const INTELLIFLO_3 = 0x80;
        const INTELLIFLO_4 = 0x100;
        const INTELLIFLO_5 = 0x200;
        const INTELLIFLO_6 = 0x400;
        const INTELLIFLO_7 = 0x800;
        const NO_SPECIAL_LIGHTS = 0x1000;
        const HAS_COOLING = 0x2000;
        const MAGIC_STREAM = 0x4000;
        const INTELLICHEM = 0x8000;
        const HYBRID_HEATER = 0x10000;
    }
}

/// Pump model, from `pump.<index>.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpType {
    IntelliFloVf,
    IntelliFloVs,
    IntelliFloVsf,
}

impl PumpType {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(PumpType::IntelliFloVf),
            2 => Some(PumpType::IntelliFloVs),
            3 => Some(PumpType::IntelliFloVsf),
            _ => None,
        }
    }
}

/// Device data reported by a gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayData(Value);

impl GatewayData {
    pub fn new(data: Value) -> Self {
        Self(data)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Walk the tree; indexes match object keys like `"0"` or array positions
    pub fn get_data(&self, path: &[PathSegment]) -> Option<&Value> {
        path.iter().try_fold(&self.0, |node, segment| match segment {
            PathSegment::Key(key) => node.get(key.as_str()),
            PathSegment::Index(index) => match node {
                Value::Array(items) => items.get(*index as usize),
                _ => node.get(index.to_string()),
            },
        })
    }

    /// The `value` attribute of the data point at `path`
    pub fn get_value(&self, path: &[PathSegment]) -> Option<&Value> {
        self.get_data(path)?.get(attr::VALUE)
    }

    /// True if `path` exists and its value is neither null, false, zero nor empty
    pub fn is_truthy(&self, path: &ScreenLogicDataPath) -> bool {
        match self.get_data(path.segments()) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
        }
    }

    pub fn equipment_flags(&self) -> EquipmentFlags {
        let path = [
            PathSegment::from(device::CONTROLLER),
            PathSegment::from(group::EQUIPMENT),
            PathSegment::from(value::FLAGS),
        ];
        self.get_data(&path)
            .and_then(Value::as_u64)
            .and_then(|bits| u32::try_from(bits).ok())
            .map(EquipmentFlags::from_bits_truncate)
            .unwrap_or_else(EquipmentFlags::empty)
    }

    /// Numeric indexes present under a device, in ascending order
    pub fn indexes(&self, device: &str) -> Vec<u32> {
        let mut indexes: Vec<u32> = match self.0.get(device) {
            Some(Value::Object(map)) => map.keys().filter_map(|k| k.parse().ok()).collect(),
            Some(Value::Array(items)) => (0..items.len() as u32).collect(),
            _ => Vec::new(),
        };
        indexes.sort_unstable();
        indexes
    }

    pub fn pump_type(&self, index: u32) -> Option<PumpType> {
        let path = [
            PathSegment::from(device::PUMP),
            PathSegment::Index(index),
            PathSegment::from(value::TYPE),
        ];
        self.get_data(&path)
            .and_then(Value::as_u64)
            .and_then(PumpType::from_code)
    }

    pub fn controller_model(&self) -> Option<&str> {
        let path = [
            PathSegment::from(device::CONTROLLER),
            PathSegment::from(value::MODEL),
        ];
        self.get_value(&path).and_then(Value::as_str)
    }

    pub fn firmware_version(&self) -> Option<&str> {
        let path = [
            PathSegment::from(device::ADAPTER),
            PathSegment::from(value::FIRMWARE),
        ];
        self.get_value(&path).and_then(Value::as_str)
    }
}

/// A connection to one ScreenLogic gateway
#[async_trait]
pub trait ScreenLogicGateway: Send + Sync {
    async fn async_connect(&mut self, info: &ConnectionInfo) -> Result<(), GatewayError>;

    async fn async_disconnect(&mut self) -> Result<(), GatewayError>;

    /// Fetch the current state of all equipment
    async fn async_update(&mut self) -> Result<(), GatewayError>;

    fn is_connected(&self) -> bool;

    fn name(&self) -> &str;

    fn mac(&self) -> &str;

    fn data(&self) -> &GatewayData;
}

/// Creates a fresh, unconnected gateway for each setup
pub type GatewayFactory = Arc<dyn Fn() -> Box<dyn ScreenLogicGateway> + Send + Sync>;
