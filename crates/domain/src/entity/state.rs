//! Entity state — the current operational state of an entity.

use serde::{Deserialize, Serialize};

/// Discrete operational state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    On,
    Off,
    /// Nothing has been observed yet.
    #[default]
    Unknown,
    /// The last attempt to reach the device failed.
    Unavailable,
}

impl From<bool> for EntityState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Unknown => f.write_str("unknown"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_power_flag_to_on_off() {
        assert_eq!(EntityState::from(true), EntityState::On);
        assert_eq!(EntityState::from(false), EntityState::Off);
    }

    #[test]
    fn should_default_to_unknown() {
        assert_eq!(EntityState::default(), EntityState::Unknown);
    }

    #[test]
    fn should_serialize_as_lowercase_string() {
        let json = serde_json::to_string(&EntityState::Unavailable).unwrap();
        assert_eq!(json, "\"unavailable\"");
        assert_eq!(EntityState::On.to_string(), "on");
    }
}
