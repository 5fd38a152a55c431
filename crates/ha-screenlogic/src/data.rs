//! Data paths into the gateway data tree
//!
//! A [`ScreenLogicDataPath`] is a concrete location such as
//! `pump.0.watts_now`. A [`PathTemplate`] describes a location relative to
//! another one using [`PathPart`] placeholders, and [`realize_path_template`]
//! fills those placeholders in from a concrete path.

use std::fmt;

use thiserror::Error;

/// A single step into the gateway data tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(u32),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            PathSegment::Index(index) => Some(*index),
            PathSegment::Key(_) => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<u32> for PathSegment {
    fn from(index: u32) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A concrete location in the gateway data tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ScreenLogicDataPath(Vec<PathSegment>);

impl ScreenLogicDataPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// The `(device, group, data key)` triple of an entity's data point
    pub fn parts(&self) -> Option<(&PathSegment, &PathSegment, &PathSegment)> {
        match self.0.as_slice() {
            [device, group, data_key] => Some((device, group, data_key)),
            _ => None,
        }
    }

    pub fn data_key(&self) -> Option<&PathSegment> {
        self.0.last()
    }
}

impl FromIterator<PathSegment> for ScreenLogicDataPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ScreenLogicDataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{segment}")?;
        }
        f.write_str(")")
    }
}

/// Placeholders of a path template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathPart {
    Device,
    Index,
    Key,
    Value,
}

impl fmt::Display for PathPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PathPart::Device => "!device",
            PathPart::Index => "!index",
            PathPart::Key => "!key",
            PathPart::Value => "!sensor",
        };
        f.write_str(tag)
    }
}

/// One element of a path template: a placeholder or a literal segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplatePart {
    Part(PathPart),
    Literal(PathSegment),
}

impl From<PathPart> for TemplatePart {
    fn from(part: PathPart) -> Self {
        TemplatePart::Part(part)
    }
}

impl From<PathSegment> for TemplatePart {
    fn from(segment: PathSegment) -> Self {
        TemplatePart::Literal(segment)
    }
}

impl From<&str> for TemplatePart {
    fn from(key: &str) -> Self {
        TemplatePart::Literal(PathSegment::from(key))
    }
}

impl From<u32> for TemplatePart {
    fn from(index: u32) -> Self {
        TemplatePart::Literal(PathSegment::Index(index))
    }
}

impl fmt::Display for TemplatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplatePart::Part(part) => write!(f, "{part}"),
            TemplatePart::Literal(segment) => write!(f, "{segment}"),
        }
    }
}

/// A location relative to an entity's own data path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathTemplate(Vec<TemplatePart>);

impl PathTemplate {
    pub fn new(parts: Vec<TemplatePart>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.0
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{part}")?;
        }
        f.write_str(")")
    }
}

/// Build a [`ScreenLogicDataPath`] from keys and indexes
///
/// ```
/// use ha_screenlogic::{data_path, keys::{device, value}};
///
/// let path = data_path!(device::PUMP, 0_u32, value::WATTS_NOW);
/// assert_eq!(path.to_string(), "(pump, 0, watts_now)");
/// ```
#[macro_export]
macro_rules! data_path {
    ($($segment:expr),* $(,)?) => {
        $crate::data::ScreenLogicDataPath::new(vec![
            $($crate::data::PathSegment::from($segment)),*
        ])
    };
}

/// Build a [`PathTemplate`] from placeholders and literal segments
#[macro_export]
macro_rules! path_template {
    ($($part:expr),* $(,)?) => {
        $crate::data::PathTemplate::new(vec![
            $($crate::data::TemplatePart::from($part)),*
        ])
    };
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataPathError {
    #[error("Missing or invalid data path {data_path} for template path {template}")]
    IncompleteDataPath {
        template: PathTemplate,
        data_path: ScreenLogicDataPath,
    },
}

/// Fill in a path template from a `(device, group, data key)` data path
///
/// `Device` takes the device, `Index` and `Key` take the group, `Value`
/// takes the data key and literal segments are kept as they are. The data
/// path must hold all three positions.
pub fn realize_path_template(
    template: &PathTemplate,
    data_path: &ScreenLogicDataPath,
) -> Result<ScreenLogicDataPath, DataPathError> {
    let Some((device, group, data_key)) = data_path.parts() else {
        return Err(DataPathError::IncompleteDataPath {
            template: template.clone(),
            data_path: data_path.clone(),
        });
    };

    Ok(template
        .parts()
        .iter()
        .map(|part| match part {
            TemplatePart::Part(PathPart::Device) => device.clone(),
            TemplatePart::Part(PathPart::Index | PathPart::Key) => group.clone(),
            TemplatePart::Part(PathPart::Value) => data_key.clone(),
            TemplatePart::Literal(segment) => segment.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{attr, device, group, value};

    #[test]
    fn test_realize_prefix() {
        let template = path_template!(PathPart::Device, PathPart::Index);
        let data_path = data_path!(device::PUMP, 0_u32, value::WATTS_NOW);

        assert_eq!(
            realize_path_template(&template, &data_path).unwrap(),
            data_path!(device::PUMP, 0_u32)
        );
    }

    #[test]
    fn test_realize_with_literal() {
        let template = path_template!(
            PathPart::Device,
            PathPart::Index,
            PathPart::Value,
            attr::NAME_INDEX
        );
        let data_path = data_path!(device::CIRCUIT, 500_u32, group::CONFIGURATION);

        assert_eq!(
            realize_path_template(&template, &data_path).unwrap(),
            data_path!(device::CIRCUIT, 500_u32, group::CONFIGURATION, attr::NAME_INDEX)
        );
    }

    #[test]
    fn test_key_uses_group_position() {
        let template = path_template!(PathPart::Device, PathPart::Key, value::STATE);
        let data_path = data_path!(device::CONTROLLER, group::SENSOR, value::AIR_TEMPERATURE);

        assert_eq!(
            realize_path_template(&template, &data_path).unwrap(),
            data_path!(device::CONTROLLER, group::SENSOR, value::STATE)
        );
    }

    #[test]
    fn test_short_data_path_is_an_error() {
        let template = path_template!(PathPart::Device, PathPart::Key, attr::VALUE);
        let data_path = data_path!(device::ADAPTER, value::FIRMWARE);

        let err = realize_path_template(&template, &data_path).unwrap_err();
        assert!(matches!(err, DataPathError::IncompleteDataPath { .. }));
        assert_eq!(
            err.to_string(),
            "Missing or invalid data path (adapter, firmware) for template path \
             (!device, !key, value)"
        );
    }

    #[test]
    fn test_empty_data_path_is_an_error() {
        let template = path_template!(PathPart::Device);
        assert!(realize_path_template(&template, &ScreenLogicDataPath::default()).is_err());
    }

    #[test]
    fn test_segment_accessors() {
        let path = data_path!(device::PUMP, 1_u32, value::RPM_NOW);
        let (dev, index, key) = path.parts().unwrap();
        assert_eq!(dev.as_key(), Some(device::PUMP));
        assert_eq!(index.as_index(), Some(1));
        assert_eq!(key.as_key(), Some(value::RPM_NOW));
        assert_eq!(path.to_string(), "(pump, 1, rpm_now)");
    }
}
