//! Property map — logical property names to MIoT `(siid, piid)` addresses.
//!
//! This table is the only place that knows the wire-level addressing of the
//! Air Purifier Pro H. Every other module asks for properties by name.

use crate::error::PurifierError;

/// Protocol address of one device property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub service_id: u32,
    pub property_id: u32,
}

const fn prop(name: &'static str, service_id: u32, property_id: u32) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        service_id,
        property_id,
    }
}

/// Ordered, read-only lookup table of [`PropertyDescriptor`]s.
#[derive(Debug, Clone, Copy)]
pub struct PropertyMap {
    properties: &'static [PropertyDescriptor],
    available: &'static [&'static str],
}

/// MIoT spec of the Air Purifier Pro H (`zhimi.airpurifier.va1`).
pub const PURIFIER_PRO_H: PropertyMap = PropertyMap {
    properties: &[
        // air-purifier (siid 2)
        prop("power", 2, 2),
        // 0 silent, 1..=3 manual levels
        prop("fan_level", 2, 4),
        // 0 auto, 1 silent, 2 favorite, 3 manual
        prop("mode", 2, 5),
        // environment (siid 3)
        prop("humidity", 3, 7),
        prop("temperature", 3, 8),
        prop("aqi", 3, 6),
        // filter (siid 4)
        prop("filter_life_remaining", 4, 3),
        prop("filter_hours_used", 4, 5),
        // alarm (siid 5): 0 off, 50 on
        prop("buzzer", 5, 2),
        // indicator light (siid 6): 0 bright, 1 dim, 2 off
        prop("led_brightness", 6, 1),
        // physical control lock (siid 7)
        prop("child_lock", 7, 1),
        // motor (siid 10)
        prop("favorite_level", 10, 10),
        prop("set_favorite_rpm", 10, 7),
        prop("motor_speed", 10, 8),
        prop("use_time", 12, 1),
        prop("purify_volume", 13, 1),
        prop("average_aqi", 13, 2),
    ],
    available: &[
        "power",
        "fan_level",
        "mode",
        "humidity",
        "temperature",
        "aqi",
        "filter_life_remaining",
        "filter_hours_used",
        "buzzer",
        "led_brightness",
        "child_lock",
        "favorite_level",
        "use_time",
        "purify_volume",
        "average_aqi",
        "motor_speed",
    ],
};

impl PropertyMap {
    /// Resolve a property name to its address.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierError::UnknownProperty`] when `name` is not mapped.
    pub fn lookup(&self, name: &str) -> Result<PropertyDescriptor, PurifierError> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .copied()
            .ok_or_else(|| PurifierError::UnknownProperty(name.to_string()))
    }

    /// Every mapped property, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static PropertyDescriptor> {
        self.properties.iter()
    }

    /// Names of the properties polled on every refresh, in polling order.
    #[must_use]
    pub fn available(&self) -> &'static [&'static str] {
        self.available
    }
}
