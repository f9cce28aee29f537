//! Service registry — the hub-side catalogue of services and the single
//! entry point for service calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use airhub_domain::error::{HubError, ValidationError};
use airhub_domain::service::{ServiceCall, ServiceDefinition, ServiceOutcome};

use crate::ports::Integration;

/// Routes [`ServiceCall`]s to the integration that registered them.
///
/// Calls naming a `(domain, service)` pair the integration never registered
/// are rejected here and never reach the integration.
pub struct ServiceRegistry<I> {
    integration: Arc<I>,
    /// `domain -> service -> definition`
    definitions: BTreeMap<&'static str, BTreeMap<&'static str, ServiceDefinition>>,
}

impl<I: Integration> ServiceRegistry<I> {
    /// Record every service `integration` declares.
    pub fn register(integration: Arc<I>) -> Self {
        let mut definitions: BTreeMap<_, BTreeMap<_, _>> = BTreeMap::new();
        for def in integration.services() {
            definitions
                .entry(def.domain)
                .or_default()
                .insert(def.service, def);
        }

        tracing::info!(
            integration = integration.name(),
            count = definitions.values().map(BTreeMap::len).sum::<usize>(),
            "services registered"
        );

        Self {
            integration,
            definitions,
        }
    }

    /// Look up the definition of `domain.service`.
    #[must_use]
    pub fn get(&self, domain: &str, service: &str) -> Option<&ServiceDefinition> {
        self.definitions.get(domain)?.get(service)
    }

    /// All registered definitions, sorted by `domain.service`.
    #[must_use]
    pub fn definitions(&self) -> Vec<&ServiceDefinition> {
        self.definitions.values().flat_map(BTreeMap::values).collect()
    }

    /// Dispatch `call` to the owning integration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownService`] when the service was never
    /// registered, or whatever the integration returns for the call as a
    /// whole. Per-entity failures are carried in the outcomes.
    pub async fn call(&self, call: &ServiceCall) -> Result<Vec<ServiceOutcome>, HubError> {
        if self.get(&call.domain, &call.service).is_none() {
            return Err(ValidationError::UnknownService {
                domain: call.domain.clone(),
                service: call.service.clone(),
            }
            .into());
        }

        let outcomes = self.integration.handle_service_call(call).await?;
        for outcome in &outcomes {
            if let Err(err) = &outcome.result {
                tracing::warn!(
                    entity_id = %outcome.entity_id,
                    service = %call.service,
                    %err,
                    "service call failed"
                );
            }
        }
        Ok(outcomes)
    }
}
