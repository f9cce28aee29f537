//! # airhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the [`Integration`](ports::Integration) port that device
//!   adapters implement
//! - Keep the catalogue of services integrations register, and reject calls
//!   nobody registered ([`ServiceRegistry`](services::service_registry::ServiceRegistry))
//! - Poll integrations on a fixed interval and forward fresh entity
//!   snapshots ([`UpdateCoordinator`](coordinator::UpdateCoordinator))
//!
//! ## Dependency rule
//! Depends on `airhub-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod coordinator;
pub mod ports;
pub mod services;
