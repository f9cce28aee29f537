//! Application services.

pub mod service_registry;
