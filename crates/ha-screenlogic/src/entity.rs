//! ScreenLogic entities
//!
//! Each entity is described by the data point it reads. At platform setup
//! a description either becomes a registered entity or, when the gateway
//! doesn't report its data point, has any stale registry entry removed.

use std::sync::Arc;

use ha_core::Platform;
use ha_registries::{EntityCategory, EntityRegistration, EntityRegistry};
use serde_json::Value;
use tracing::{debug, warn};

use crate::consts::DOMAIN;
use crate::coordinator::ScreenLogicCoordinator;
use crate::data::{realize_path_template, PathSegment, PathTemplate, ScreenLogicDataPath};
use crate::gateway::{EquipmentFlags, GatewayData};
use crate::keys::attr;
use crate::util::{cleanup_excluded_entity, entity_unique_id, get_ha_unit};

/// What an entity reads and when it exists
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenLogicEntityDescription {
    /// `(device, group or index, data key)`
    pub data_path: ScreenLogicDataPath,
    pub device_class: Option<&'static str>,
    pub entity_category: Option<EntityCategory>,
    pub enabled_by_default: bool,
    /// Equipment that must be installed
    pub required_flag: Option<EquipmentFlags>,
    /// Data point, relative to `data_path`, that must be truthy
    pub inclusion_path: Option<PathTemplate>,
    /// Never created for this piece of equipment
    pub excluded: bool,
}

impl ScreenLogicEntityDescription {
    pub fn new(device: &str, group: impl Into<PathSegment>, key: &str) -> Self {
        Self {
            data_path: ScreenLogicDataPath::new(vec![
                PathSegment::from(device),
                group.into(),
                PathSegment::from(key),
            ]),
            device_class: None,
            entity_category: None,
            enabled_by_default: true,
            required_flag: None,
            inclusion_path: None,
            excluded: false,
        }
    }

    pub fn device_class(mut self, device_class: &'static str) -> Self {
        self.device_class = Some(device_class);
        self
    }

    pub fn entity_category(mut self, category: EntityCategory) -> Self {
        self.entity_category = Some(category);
        self
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    pub fn requires(mut self, flag: EquipmentFlags) -> Self {
        self.required_flag = Some(flag);
        self
    }

    pub fn included_when(mut self, template: PathTemplate) -> Self {
        self.inclusion_path = Some(template);
        self
    }

    pub fn excluded_if(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }

    /// Whether the gateway reports this description's data point
    pub fn is_reported(&self, data: &GatewayData) -> bool {
        if self.excluded {
            return false;
        }

        if let Some(flag) = self.required_flag {
            if !data.equipment_flags().contains(flag) {
                return false;
            }
        }

        if let Some(ref template) = self.inclusion_path {
            match realize_path_template(template, &self.data_path) {
                Ok(path) if data.is_truthy(&path) => {}
                Ok(_) => return false,
                Err(e) => {
                    warn!("{}", e);
                    return false;
                }
            }
        }

        data.get_data(self.data_path.segments()).is_some()
    }
}

/// A registered ScreenLogic entity
pub struct ScreenLogicEntity {
    pub entity_id: String,
    pub unique_id: String,
    pub platform: Platform,
    pub name: String,
    pub unit_of_measurement: Option<String>,
    pub description: ScreenLogicEntityDescription,
    coordinator: Arc<ScreenLogicCoordinator>,
}

impl ScreenLogicEntity {
    pub fn data_path(&self) -> &ScreenLogicDataPath {
        &self.description.data_path
    }

    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    /// Current `value` of the data point
    pub fn native_value(&self) -> Option<Value> {
        self.coordinator
            .data()
            .get_value(self.data_path().segments())
            .cloned()
    }

    /// Binary sensor state; any non-zero value is on
    pub fn is_on(&self) -> Option<bool> {
        match self.native_value()? {
            Value::Bool(on) => Some(on),
            Value::Number(n) => n.as_f64().map(|n| n != 0.0),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ScreenLogicEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenLogicEntity")
            .field("entity_id", &self.entity_id)
            .field("unique_id", &self.unique_id)
            .field("data_path", &self.description.data_path)
            .finish()
    }
}

/// What a platform setup needs from the config entry being set up
pub struct PlatformContext<'a> {
    pub config_entry_id: &'a str,
    pub device_id: &'a str,
    pub coordinator: &'a Arc<ScreenLogicCoordinator>,
    pub entity_registry: &'a EntityRegistry,
}

impl PlatformContext<'_> {
    /// Register entities for reported descriptions and clean up the rest
    pub(crate) fn add_entities(
        &self,
        platform: Platform,
        descriptions: Vec<ScreenLogicEntityDescription>,
    ) -> Vec<Arc<ScreenLogicEntity>> {
        let data = self.coordinator.data();
        let mac = self.coordinator.mac();
        let mut entities = Vec::new();

        for description in descriptions {
            if !description.is_reported(&data) {
                cleanup_excluded_entity(self.entity_registry, platform, mac, &description.data_path);
                continue;
            }

            let Some(unique_id) = entity_unique_id(mac, &description.data_path) else {
                warn!("Skipping entity with incomplete data path {}", description.data_path);
                continue;
            };

            let point = data.get_data(description.data_path.segments());
            let name = point
                .and_then(|p| p.get(attr::NAME))
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| {
                    description
                        .data_path
                        .data_key()
                        .map(ToString::to_string)
                        .unwrap_or_default()
                });
            let unit = get_ha_unit(point.and_then(|p| p.get(attr::UNIT)).and_then(Value::as_str));

            let registration = EntityRegistration::new(platform.as_str(), DOMAIN, &unique_id)
                .suggested_object_id(format!("{} {}", self.coordinator.name(), name))
                .config_entry_id(self.config_entry_id)
                .device_id(self.device_id)
                .has_entity_name(true)
                .original_name(name.clone())
                .entity_category(description.entity_category)
                .original_device_class(description.device_class.map(String::from))
                .unit_of_measurement(unit.clone());
            let registration = if description.enabled_by_default {
                registration
            } else {
                registration.disabled_by(Some(ha_registries::DisabledBy::Integration))
            };

            let entry = self.entity_registry.get_or_create(registration);
            debug!("Set up {} for {}", entry.entity_id, description.data_path);

            entities.push(Arc::new(ScreenLogicEntity {
                entity_id: entry.entity_id.clone(),
                unique_id,
                platform,
                name,
                unit_of_measurement: unit,
                description,
                coordinator: Arc::clone(self.coordinator),
            }));
        }

        entities
    }
}
