//! Air purifier adapter error types.

use airhub_domain::error::{HubError, ValidationError};

use crate::config::PurifierConfigError;
use crate::transport::PropertyValue;

/// Errors specific to the air purifier adapter.
#[derive(Debug, thiserror::Error)]
pub enum PurifierError {
    /// A property name is missing from the property map.
    #[error("unknown property {0:?}")]
    UnknownProperty(String),

    /// A service name is not in the command catalogue.
    #[error("unknown service {0:?}")]
    UnknownService(String),

    /// A caller-supplied parameter failed validation. Nothing was sent.
    #[error("invalid {field} {value} for {operation}, allowed range is {min}..={max}")]
    InvalidParameter {
        /// Service the parameter was supplied to.
        operation: &'static str,
        /// Parameter name.
        field: &'static str,
        /// The offending value as received, or `missing`.
        value: String,
        min: i64,
        max: i64,
    },

    /// The transport failed while reading or writing a property.
    #[error("device unreachable while accessing {property}")]
    DeviceUnreachable {
        property: &'static str,
        #[source]
        source: TransportError,
    },

    /// The device answered with a value of the wrong type or range.
    #[error("unexpected value {value} for {property}")]
    InvalidResponse {
        property: &'static str,
        value: PropertyValue,
    },

    /// A purifier's connection settings were rejected before contacting it.
    #[error("invalid purifier configuration")]
    InvalidConfig(#[from] PurifierConfigError),

    /// The first contact with a device failed; no entity was registered.
    #[error("failed to set up air purifier at {host}")]
    SetupFailed {
        host: String,
        #[source]
        source: Box<PurifierError>,
    },

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] HubError),
}

/// Errors raised by a [`MiotTransport`](crate::transport::MiotTransport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device did not answer in time.
    #[error("no response from device")]
    Timeout,

    /// The device answered with a protocol-level error code.
    #[error("device returned error {code}: {message}")]
    Device { code: i64, message: String },

    /// Socket-level failure.
    #[error("transport I/O error")]
    Io(#[from] std::io::Error),
}

impl PurifierError {
    /// Whether this error came from the transport rather than the caller.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::DeviceUnreachable { .. } => true,
            Self::SetupFailed { source, .. } => source.is_unreachable(),
            _ => false,
        }
    }

    /// Convert into a [`HubError`] for propagation across port boundaries.
    ///
    /// Caller mistakes become [`HubError::Validation`]; device and
    /// configuration failures are boxed into [`HubError::Integration`].
    #[must_use]
    pub fn into_domain(self) -> HubError {
        match self {
            Self::Domain(err) => err,
            Self::UnknownService(service) => ValidationError::UnknownService {
                domain: crate::DOMAIN.to_string(),
                service,
            }
            .into(),
            err @ Self::InvalidParameter { operation, .. } => {
                ValidationError::InvalidParameter {
                    operation: operation.to_string(),
                    reason: err.to_string(),
                }
                .into()
            }
            other => HubError::Integration(Box::new(other)),
        }
    }
}

impl From<PurifierError> for HubError {
    fn from(err: PurifierError) -> Self {
        err.into_domain()
    }
}

impl From<HubError> for PurifierError {
    fn from(err: HubError) -> Self {
        Self::Domain(err)
    }
}
