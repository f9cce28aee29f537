//! Service — a callable command exposed by an integration.
//!
//! Integrations register a [`ServiceDefinition`] per command they accept
//! (e.g. `fan.set_mode` with an integer `mode` in `0..=3`). Callers issue a
//! [`ServiceCall`], optionally restricted to a set of entity ids, and get
//! back one [`ServiceOutcome`] per entity the call reached.

use serde::{Deserialize, Serialize};

use crate::error::HubError;

/// An integer parameter accepted by a service, with its inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceField {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
}

impl ServiceField {
    /// Whether `value` lies inside `min..=max`.
    #[must_use]
    pub fn accepts(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Registration record for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDefinition {
    /// Entity domain the service applies to, e.g. `"fan"`.
    pub domain: &'static str,
    /// Service name, e.g. `"set_mode"`.
    pub service: &'static str,
    /// Parameters the service requires. Empty for argument-less services.
    pub fields: Vec<ServiceField>,
}

/// A request to run a service, as received from the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    /// Entity ids to target. `None` targets every entity of the integration.
    #[serde(default)]
    pub entity_ids: Option<Vec<String>>,
    /// Service parameters, keyed by field name.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ServiceCall {
    /// A call with no target filter and no parameters.
    #[must_use]
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            entity_ids: None,
            data: serde_json::Value::Null,
        }
    }

    /// Restrict the call to the given entity ids.
    #[must_use]
    pub fn target<I, S>(mut self, entity_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_ids = Some(entity_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Attach service parameters.
    #[must_use]
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Whether this call is addressed to `entity_id`.
    #[must_use]
    pub fn targets(&self, entity_id: &str) -> bool {
        self.entity_ids
            .as_ref()
            .is_none_or(|ids| ids.iter().any(|id| id == entity_id))
    }
}

/// Result of a service call for a single entity.
#[derive(Debug)]
pub struct ServiceOutcome {
    pub entity_id: String,
    pub result: Result<(), HubError>,
}

impl ServiceOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
