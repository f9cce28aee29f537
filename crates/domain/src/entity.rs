//! Entity — the central state-holding concept in airhub.
//!
//! An entity represents a single observable/controllable aspect of a device
//! (e.g. an air purifier exposed as a `fan`). Its identity is the
//! `domain.object_id` string the hub addresses it by.

mod attribute_value;
mod state;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use attribute_value::AttributeValue;
pub use state::EntityState;

use crate::error::{HubError, ValidationError};
use crate::id::{DeviceId, EntityId};

/// UTC timestamp used for `last_changed` and `last_updated`.
pub type Timestamp = DateTime<Utc>;

/// A snapshot of one entity as the hub sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub device_id: DeviceId,
    /// `domain.object_id`, e.g. `fan.bedroom_purifier`.
    pub entity_id: String,
    pub friendly_name: String,
    pub state: EntityState,
    pub attributes: BTreeMap<String, AttributeValue>,
    /// When `state` last changed value.
    pub last_changed: Timestamp,
    /// When `state` or any attribute was last written.
    pub last_updated: Timestamp,
}

impl Entity {
    /// Create a builder for constructing an [`Entity`].
    #[must_use]
    pub fn builder() -> EntityBuilder {
        EntityBuilder::default()
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when `entity_id` is empty or lacks a
    /// `domain.` prefix, or when `friendly_name` is empty.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.entity_id.is_empty() {
            return Err(ValidationError::EmptyEntityId.into());
        }
        match self.entity_id.split_once('.') {
            Some((domain, object_id)) if !domain.is_empty() && !object_id.is_empty() => {}
            _ => {
                return Err(ValidationError::MalformedEntityId(self.entity_id.clone()).into());
            }
        }
        if self.friendly_name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Entity`].
#[derive(Debug, Default)]
pub struct EntityBuilder {
    id: Option<EntityId>,
    device_id: Option<DeviceId>,
    entity_id: Option<String>,
    friendly_name: Option<String>,
    state: Option<EntityState>,
    attributes: BTreeMap<String, AttributeValue>,
}

impl EntityBuilder {
    #[must_use]
    pub fn id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: EntityState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn attributes(mut self, attributes: BTreeMap<String, AttributeValue>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Consume the builder, validate, and return an [`Entity`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if [`Entity::validate`] fails.
    pub fn build(self) -> Result<Entity, HubError> {
        let ts = Utc::now();
        let entity = Entity {
            id: self.id.unwrap_or_default(),
            device_id: self.device_id.unwrap_or_default(),
            entity_id: self.entity_id.unwrap_or_default(),
            friendly_name: self.friendly_name.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            attributes: self.attributes,
            last_changed: ts,
            last_updated: ts,
        };
        entity.validate()?;
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purifier() -> Entity {
        Entity::builder()
            .entity_id("fan.bedroom")
            .friendly_name("Bedroom")
            .state(EntityState::Off)
            .attribute("fan_level", AttributeValue::Int(2))
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_entity() {
        let entity = purifier();
        assert_eq!(entity.entity_id, "fan.bedroom");
        assert_eq!(
            entity.get_attribute("fan_level"),
            Some(&AttributeValue::Int(2))
        );
    }

    #[test]
    fn should_reject_missing_entity_id() {
        let result = Entity::builder().friendly_name("Bedroom").build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyEntityId))
        ));
    }

    #[test]
    fn should_reject_entity_id_without_domain() {
        let result = Entity::builder()
            .entity_id("bedroom")
            .friendly_name("Bedroom")
            .build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::MalformedEntityId(_)))
        ));
    }

    #[test]
    fn should_reject_empty_friendly_name() {
        let result = Entity::builder().entity_id("fan.bedroom").build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyName))
        ));
    }
}
