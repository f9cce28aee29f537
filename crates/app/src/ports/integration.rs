//! Integration port — lifecycle, polling and service-call handling for
//! device integrations.
//!
//! An integration bridges an external device protocol into the airhub
//! system. It registers its entities during setup, refreshes them when
//! polled, and handles service calls directed at entities it owns.

use std::future::Future;

use airhub_domain::device::Device;
use airhub_domain::entity::Entity;
use airhub_domain::error::HubError;
use airhub_domain::service::{ServiceCall, ServiceDefinition, ServiceOutcome};

/// A pluggable device integration.
///
/// Implementations live in adapter crates (e.g. `adapter_miot_purifier`).
/// The binary crate calls the lifecycle methods in order:
///
/// 1. [`setup`](Self::setup) — contact every configured device and register
///    the ones that answered
/// 2. [`services`](Self::services) — collect the service catalogue
/// 3. (the hub runs, polling via [`update`](Self::update) and forwarding
///    service calls via [`handle_service_call`](Self::handle_service_call))
/// 4. [`teardown`](Self::teardown) — clean up resources
pub trait Integration: Send + Sync {
    /// Unique name identifying this integration (e.g. `"miot_purifier"`).
    fn name(&self) -> &'static str;

    /// Services this integration accepts, with their parameter schemas.
    fn services(&self) -> Vec<ServiceDefinition>;

    /// Contact the configured devices and return what was registered.
    fn setup(&mut self) -> impl Future<Output = Result<Vec<DiscoveredDevice>, HubError>> + Send;

    /// Refresh every registered entity, one outcome per entity.
    fn update(&self) -> impl Future<Output = Vec<EntityUpdate>> + Send;

    /// Run a service call against every owned entity it targets.
    ///
    /// Failures of individual entities are reported in their
    /// [`ServiceOutcome`] and never abort the remaining entities; the outer
    /// `Result` is reserved for calls the integration cannot handle at all.
    fn handle_service_call(
        &self,
        call: &ServiceCall,
    ) -> impl Future<Output = Result<Vec<ServiceOutcome>, HubError>> + Send;

    /// Called on graceful shutdown. Drop every registered entity.
    fn teardown(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// A device and its associated entities registered during integration setup.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub device: Device,
    pub entities: Vec<Entity>,
}

/// Result of refreshing one entity.
#[derive(Debug)]
pub struct EntityUpdate {
    pub entity_id: String,
    pub result: Result<Entity, HubError>,
}
