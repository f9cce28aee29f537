//! Transport port — property reads and writes against a MIoT device.
//!
//! The transport owns everything below property level: encryption, the
//! handshake, request ids, timeouts. This crate only hands it an address
//! and, for writes, a value.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// A property value as carried by the MIoT protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl PropertyValue {
    /// Interpret as a flag. Integers are accepted, non-zero meaning `true`.
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Int(i) => Some(i != 0),
            Self::Float(_) => None,
        }
    }

    #[must_use]
    pub fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(i),
            Self::Bool(_) | Self::Float(_) => None,
        }
    }

    /// Interpret as a float. Integers are widened.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f),
            Self::Int(i) => Some(i as f64),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => fmt::Display::fmt(b, f),
            Self::Int(i) => fmt::Display::fmt(i, f),
            Self::Float(x) => fmt::Display::fmt(x, f),
        }
    }
}

/// Request/response access to one device's properties.
///
/// Calls against the same device are serialized by the caller; a transport
/// never sees two requests for one device in flight at once.
pub trait MiotTransport: Send + Sync {
    /// Read one property (`get_properties` with a single entry).
    fn get_property(
        &self,
        service_id: u32,
        property_id: u32,
    ) -> impl Future<Output = Result<PropertyValue, TransportError>> + Send;

    /// Write one property (`set_properties` with a single entry).
    fn set_property(
        &self,
        service_id: u32,
        property_id: u32,
        value: PropertyValue,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
