//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! at port boundaries.

/// Workspace-wide error returned across port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A domain invariant or caller-supplied value was rejected.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An integration (device protocol adapter) failed.
    #[error("integration error")]
    Integration(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A human-readable name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// An entity was built without its `domain.object_id` string.
    #[error("entity_id must not be empty")]
    EmptyEntityId,

    /// An entity id did not follow the `domain.object_id` shape.
    #[error("entity_id {0:?} must have the form `domain.object_id`")]
    MalformedEntityId(String),

    /// A service call named a service nobody registered.
    #[error("unknown service {domain}.{service}")]
    UnknownService {
        /// Service domain, e.g. `"fan"`.
        domain: String,
        /// Service name, e.g. `"set_mode"`.
        service: String,
    },

    /// A service parameter was missing, mistyped or out of range.
    #[error("invalid parameter for {operation}: {reason}")]
    InvalidParameter {
        /// Operation the parameter was supplied to.
        operation: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// A lookup by id found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of record, e.g. `"Entity"`.
    pub entity: &'static str,
    /// The id that was looked up.
    pub id: String,
}
