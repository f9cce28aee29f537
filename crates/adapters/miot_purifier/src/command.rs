//! Command catalogue — every service the purifier accepts, its parameter
//! schema, and the property it writes.

use airhub_domain::service::{ServiceDefinition, ServiceField};

use crate::error::PurifierError;
use crate::property::{PURIFIER_PRO_H, PropertyDescriptor};
use crate::transport::PropertyValue;

/// Buzzer value the device uses for "on".
const BUZZER_ON: i64 = 50;

/// The fixed set of operations exposed to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    TurnOn,
    TurnOff,
    SetMode,
    SetFanLevel,
    SetFavoriteLevel,
    SetLedBrightness,
    SetBuzzerOn,
    SetBuzzerOff,
    SetChildLockOn,
    SetChildLockOff,
}

impl CommandKind {
    pub const ALL: [Self; 10] = [
        Self::TurnOn,
        Self::TurnOff,
        Self::SetMode,
        Self::SetFanLevel,
        Self::SetFavoriteLevel,
        Self::SetLedBrightness,
        Self::SetBuzzerOn,
        Self::SetBuzzerOff,
        Self::SetChildLockOn,
        Self::SetChildLockOff,
    ];

    /// Service name the hub registers this command under.
    #[must_use]
    pub fn service(self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::SetMode => "set_mode",
            Self::SetFanLevel => "set_fan_level",
            Self::SetFavoriteLevel => "set_favorite_level",
            Self::SetLedBrightness => "set_led_brightness",
            Self::SetBuzzerOn => "set_buzzer_on",
            Self::SetBuzzerOff => "set_buzzer_off",
            Self::SetChildLockOn => "set_child_lock_on",
            Self::SetChildLockOff => "set_child_lock_off",
        }
    }

    /// Resolve a service name.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierError::UnknownService`] for names outside the catalogue.
    pub fn from_service(service: &str) -> Result<Self, PurifierError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.service() == service)
            .ok_or_else(|| PurifierError::UnknownService(service.to_string()))
    }

    /// Name of the property this command writes.
    #[must_use]
    pub fn property(self) -> &'static str {
        match self {
            Self::TurnOn | Self::TurnOff => "power",
            Self::SetMode => "mode",
            Self::SetFanLevel => "fan_level",
            Self::SetFavoriteLevel => "favorite_level",
            Self::SetLedBrightness => "led_brightness",
            Self::SetBuzzerOn | Self::SetBuzzerOff => "buzzer",
            Self::SetChildLockOn | Self::SetChildLockOff => "child_lock",
        }
    }

    /// Address of the property this command writes.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierError::UnknownProperty`] if the property map lacks
    /// the target, which means the map and this catalogue disagree.
    pub fn target(self) -> Result<PropertyDescriptor, PurifierError> {
        PURIFIER_PRO_H.lookup(self.property())
    }

    /// What this command writes: a fixed value, or a caller-supplied
    /// integer bounded by a schema.
    fn payload(self) -> Payload {
        let ranged = |name: &'static str, min: i64, max: i64| {
            Payload::Ranged(ServiceField { name, min, max })
        };
        match self {
            Self::TurnOn | Self::SetChildLockOn => Payload::Fixed(PropertyValue::Bool(true)),
            Self::TurnOff | Self::SetChildLockOff => Payload::Fixed(PropertyValue::Bool(false)),
            Self::SetBuzzerOn => Payload::Fixed(PropertyValue::Int(BUZZER_ON)),
            Self::SetBuzzerOff => Payload::Fixed(PropertyValue::Int(0)),
            Self::SetMode => ranged("mode", 0, 3),
            Self::SetFanLevel => ranged("fan_level", 0, 3),
            Self::SetFavoriteLevel => ranged("favorite_level", 1, 10),
            Self::SetLedBrightness => ranged("led_brightness", 0, 2),
        }
    }

    /// The single parameter this command takes, with its inclusive range.
    #[must_use]
    pub fn schema(self) -> Option<ServiceField> {
        match self.payload() {
            Payload::Ranged(field) => Some(field),
            Payload::Fixed(_) => None,
        }
    }

    /// Power toggles run in any state; everything else needs the device on.
    #[must_use]
    pub fn requires_on(self) -> bool {
        !matches!(self, Self::TurnOn | Self::TurnOff)
    }

    /// Registration record for the hub's service registry.
    #[must_use]
    pub fn definition(self) -> ServiceDefinition {
        ServiceDefinition {
            domain: crate::DOMAIN,
            service: self.service(),
            fields: self.schema().into_iter().collect(),
        }
    }

    /// Validate `data` against this command's schema and produce the value
    /// to write. Never touches the device.
    ///
    /// Integers, integral floats and integer strings are accepted; anything
    /// else, or a value outside the range, is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierError::InvalidParameter`] naming the operation, the
    /// offending value and the allowed range.
    pub fn parse(self, data: &serde_json::Value) -> Result<Command, PurifierError> {
        let value = match self.payload() {
            Payload::Fixed(value) => value,
            Payload::Ranged(field) => PropertyValue::Int(self.validate(field, data.get(field.name))?),
        };
        Ok(Command { kind: self, value })
    }

    fn validate(
        self,
        field: ServiceField,
        raw: Option<&serde_json::Value>,
    ) -> Result<i64, PurifierError> {
        let invalid = |value: String| PurifierError::InvalidParameter {
            operation: self.service(),
            field: field.name,
            value,
            min: field.min,
            max: field.max,
        };

        let raw = raw.ok_or_else(|| invalid("missing".to_string()))?;
        let value = coerce_int(raw).ok_or_else(|| invalid(raw.to_string()))?;
        if !field.accepts(value) {
            return Err(invalid(value.to_string()));
        }
        Ok(value)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn coerce_int(raw: &serde_json::Value) -> Option<i64> {
    match raw {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Payload {
    Fixed(PropertyValue),
    Ranged(ServiceField),
}

/// A validated command, ready to be written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub value: PropertyValue,
}
