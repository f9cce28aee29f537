//! Typed identifiers backed by random UUIDs.
//!
//! [`Id`] carries a marker type so an [`EntityId`] cannot be passed where a
//! [`DeviceId`] is expected. On the wire both are a bare UUID string.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Marker for [`EntityId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityMarker;

/// Marker for [`DeviceId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceMarker;

/// Identifier of an [`Entity`](crate::entity::Entity).
pub type EntityId = Id<EntityMarker>;

/// Identifier of a [`Device`](crate::device::Device).
pub type DeviceId = Id<DeviceMarker>;

/// A random UUID tagged with the kind of record it identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id<K> {
    uuid: Uuid,
    kind: PhantomData<K>,
}

impl<K> Id<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind: PhantomData,
        }
    }
}

impl<K> Default for Id<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

impl<K> Serialize for Id<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.uuid.serialize(serializer)
    }
}

impl<'de, K> Deserialize<'de> for Id<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(|uuid| Self {
            uuid,
            kind: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn should_serialize_as_bare_uuid_string() {
        let id = DeviceId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));

        let back: DeviceId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn should_reject_malformed_uuid() {
        let result: Result<EntityId, _> = serde_json::from_str("\"not-a-uuid\"");
        assert!(result.is_err());
    }
}
