//! Device state — the typed snapshot assembled from one refresh.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use airhub_domain::entity::AttributeValue;

use crate::error::PurifierError;
use crate::transport::PropertyValue;

/// Named fan speed derived from `fan_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Off,
    Low,
    Medium,
    High,
}

impl Speed {
    /// Every speed, ordered by increasing fan level.
    pub const ALL: [Self; 4] = [Self::Off, Self::Low, Self::Medium, Self::High];

    /// Map a raw `fan_level` to its speed. Levels above 3 have no name.
    #[must_use]
    pub fn from_fan_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Self::Off),
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the attribute carrying the derived [`Speed`].
pub const SPEED_ATTRIBUTE: &str = "speed";

/// Last observed values of every polled property, plus derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceState {
    pub power: bool,
    pub fan_level: i64,
    pub speed: Speed,
    pub mode: i64,
    pub humidity: i64,
    pub temperature: f64,
    pub aqi: i64,
    pub filter_life_remaining: i64,
    pub filter_hours_used: i64,
    pub buzzer: bool,
    pub led_brightness: i64,
    pub child_lock: bool,
    pub favorite_level: i64,
    pub use_time: i64,
    pub purify_volume: i64,
    pub average_aqi: i64,
    pub motor_speed: i64,
}

impl DeviceState {
    /// Build a snapshot from one value per polled property.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierError::InvalidResponse`] when a value has the wrong
    /// type or `fan_level` lies outside `0..=3`, and
    /// [`PurifierError::UnknownProperty`] when a polled property is missing.
    pub fn from_readings(
        readings: &HashMap<&'static str, PropertyValue>,
    ) -> Result<Self, PurifierError> {
        let r = Readings(readings);
        let fan_level = r.int("fan_level")?;
        let speed = Speed::from_fan_level(fan_level).ok_or(PurifierError::InvalidResponse {
            property: "fan_level",
            value: PropertyValue::Int(fan_level),
        })?;

        Ok(Self {
            power: r.flag("power")?,
            fan_level,
            speed,
            mode: r.int("mode")?,
            humidity: r.int("humidity")?,
            temperature: r.float("temperature")?,
            aqi: r.int("aqi")?,
            filter_life_remaining: r.int("filter_life_remaining")?,
            filter_hours_used: r.int("filter_hours_used")?,
            buzzer: r.flag("buzzer")?,
            led_brightness: r.int("led_brightness")?,
            child_lock: r.flag("child_lock")?,
            favorite_level: r.int("favorite_level")?,
            use_time: r.int("use_time")?,
            purify_volume: r.int("purify_volume")?,
            average_aqi: r.int("average_aqi")?,
            motor_speed: r.int("motor_speed")?,
        })
    }

    /// The value of one polled or derived attribute, `None` for names this
    /// state does not carry.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        let value: AttributeValue = match name {
            "power" => self.power.into(),
            "fan_level" => self.fan_level.into(),
            SPEED_ATTRIBUTE => self.speed.as_str().into(),
            "mode" => self.mode.into(),
            "humidity" => self.humidity.into(),
            "temperature" => self.temperature.into(),
            "aqi" => self.aqi.into(),
            "filter_life_remaining" => self.filter_life_remaining.into(),
            "filter_hours_used" => self.filter_hours_used.into(),
            "buzzer" => self.buzzer.into(),
            "led_brightness" => self.led_brightness.into(),
            "child_lock" => self.child_lock.into(),
            "favorite_level" => self.favorite_level.into(),
            "use_time" => self.use_time.into(),
            "purify_volume" => self.purify_volume.into(),
            "average_aqi" => self.average_aqi.into(),
            "motor_speed" => self.motor_speed.into(),
            _ => return None,
        };
        Some(value)
    }
}

struct Readings<'a>(&'a HashMap<&'static str, PropertyValue>);

impl Readings<'_> {
    fn get(&self, name: &'static str) -> Result<PropertyValue, PurifierError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| PurifierError::UnknownProperty(name.to_string()))
    }

    fn typed<T>(
        &self,
        name: &'static str,
        convert: fn(PropertyValue) -> Option<T>,
    ) -> Result<T, PurifierError> {
        let value = self.get(name)?;
        convert(value).ok_or(PurifierError::InvalidResponse {
            property: name,
            value,
        })
    }

    fn flag(&self, name: &'static str) -> Result<bool, PurifierError> {
        self.typed(name, PropertyValue::as_bool)
    }

    fn int(&self, name: &'static str) -> Result<i64, PurifierError> {
        self.typed(name, PropertyValue::as_int)
    }

    fn float(&self, name: &'static str) -> Result<f64, PurifierError> {
        self.typed(name, PropertyValue::as_float)
    }
}
