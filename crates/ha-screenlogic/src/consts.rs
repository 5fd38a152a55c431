//! Integration constants

use std::time::Duration;

pub const DOMAIN: &str = "screenlogic";
pub const MANUFACTURER: &str = "Pentair";

/// Config entry data keys
pub const CONF_IP_ADDRESS: &str = "ip_address";
pub const CONF_PORT: &str = "port";

/// Config entry option keys
pub const CONF_SCAN_INTERVAL: &str = "scan_interval";

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(10);
