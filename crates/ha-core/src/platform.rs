//! Entity platform domains

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unknown platform domain
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

/// Entity platforms an integration can forward a config entry to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    BinarySensor,
    Sensor,
}

impl Platform {
    /// Domain string used in entity IDs (e.g. `sensor` in `sensor.air_temperature`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::BinarySensor => "binary_sensor",
            Platform::Sensor => "sensor",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary_sensor" => Ok(Platform::BinarySensor),
            "sensor" => Ok(Platform::Sensor),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_str() {
        assert_eq!(Platform::Sensor.as_str(), "sensor");
        assert_eq!(Platform::BinarySensor.to_string(), "binary_sensor");
        assert_eq!("sensor".parse::<Platform>(), Ok(Platform::Sensor));
        assert!("light".parse::<Platform>().is_err());
    }
}
