//! # airhub-adapter-miot-purifier
//!
//! Integration for the Xiaomi Air Purifier Pro H (`zhimi.airpurifier.va1`),
//! a MIoT device whose values are addressed by `(siid, piid)` pairs.
//!
//! Each configured purifier becomes one `fan` entity. Polling reads every
//! mapped property into a typed [`DeviceState`]; service calls are validated
//! against the [`CommandKind`] catalogue and turned into one property write
//! per targeted entity.
//!
//! ## Services
//!
//! | Service | Parameter | Writes |
//! |---------|-----------|--------|
//! | `turn_on` / `turn_off` | | `power` |
//! | `set_mode` | `mode` 0..=3 | `mode` |
//! | `set_fan_level` | `fan_level` 0..=3 | `fan_level` |
//! | `set_favorite_level` | `favorite_level` 1..=10 | `favorite_level` |
//! | `set_led_brightness` | `led_brightness` 0..=2 | `led_brightness` |
//! | `set_buzzer_on` / `set_buzzer_off` | | `buzzer` |
//! | `set_child_lock_on` / `set_child_lock_off` | | `child_lock` |
//!
//! ## Dependency rule
//!
//! Depends on `airhub-app` (port traits) and `airhub-domain` only. The wire
//! protocol is reached through [`MiotTransport`].

mod command;
mod config;
mod error;
mod property;
mod purifier;
mod simulated;
mod state;
mod transport;

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::Mutex;

use airhub_app::ports::{DiscoveredDevice, EntityUpdate, Integration};
use airhub_domain::error::{HubError, NotFoundError, ValidationError};
use airhub_domain::service::{ServiceCall, ServiceDefinition, ServiceOutcome};

pub use command::{Command, CommandKind};
pub use config::{DEFAULT_NAME, PurifierConfig, PurifierConfigError};
pub use error::{PurifierError, TransportError};
pub use property::{PURIFIER_PRO_H, PropertyDescriptor, PropertyMap};
pub use purifier::AirPurifier;
pub use simulated::{RecordedWrite, SimulatedPurifier};
pub use state::{DeviceState, SPEED_ATTRIBUTE, Speed};
pub use transport::{MiotTransport, PropertyValue};

/// Entity domain of every purifier entity.
pub const DOMAIN: &str = "fan";

/// Name this integration registers under.
pub const INTEGRATION_NAME: &str = "miot_purifier";

/// Every configured purifier, keyed by entity id once set up.
pub struct AirPurifierIntegration<T> {
    pending: Vec<(PurifierConfig, T)>,
    entities: BTreeMap<String, Mutex<AirPurifier<T>>>,
}

impl<T> Default for AirPurifierIntegration<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            entities: BTreeMap::new(),
        }
    }
}

impl<T: MiotTransport> AirPurifierIntegration<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a purifier for the next [`setup`](Integration::setup).
    #[must_use]
    pub fn with_device(mut self, config: PurifierConfig, transport: T) -> Self {
        self.pending.push((config, transport));
        self
    }

    /// Entity ids of every registered purifier, sorted.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }

    /// Snapshot of one purifier's cached state.
    pub async fn state(&self, entity_id: &str) -> Option<DeviceState> {
        let purifier = self.entities.get(entity_id)?;
        purifier.lock().await.state().cloned()
    }

    /// Validate, contact and describe one purifier.
    async fn setup_device(
        &self,
        config: PurifierConfig,
        transport: T,
    ) -> Result<(AirPurifier<T>, DiscoveredDevice), PurifierError> {
        let host = config.host.clone();
        self.prepare_device(config, transport)
            .await
            .and_then(Self::describe)
            .map_err(|err| PurifierError::SetupFailed {
                host,
                source: Box::new(err),
            })
    }

    async fn prepare_device(
        &self,
        config: PurifierConfig,
        transport: T,
    ) -> Result<AirPurifier<T>, PurifierError> {
        config.validate()?;
        tracing::info!(
            host = %config.host,
            token = %config.token_hint(),
            name = %config.name,
            "initializing air purifier"
        );

        let mut purifier = AirPurifier::new(config.name, config.host, transport);
        let entity_id = self.unique_entity_id(purifier.entity_id());
        purifier = purifier.with_entity_id(entity_id);
        purifier.refresh().await?;
        Ok(purifier)
    }

    fn describe(
        purifier: AirPurifier<T>,
    ) -> Result<(AirPurifier<T>, DiscoveredDevice), PurifierError> {
        let discovered = DiscoveredDevice {
            device: purifier.device()?,
            entities: vec![purifier.to_entity()?],
        };
        Ok((purifier, discovered))
    }

    fn unique_entity_id(&self, base: &str) -> String {
        if !self.entities.contains_key(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !self.entities.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Run `command` on one purifier, then refresh it.
///
/// The outcome is the command's own. A failed follow-up refresh only marks
/// the entity unavailable.
async fn run_command<T: MiotTransport>(
    entity_id: &str,
    purifier: &Mutex<AirPurifier<T>>,
    command: Command,
) -> Result<(), PurifierError> {
    let mut purifier = purifier.lock().await;
    purifier.execute(command).await?;
    if let Err(err) = purifier.refresh().await {
        tracing::warn!(entity_id, %err, "refresh after command failed");
    }
    Ok(())
}

impl<T: MiotTransport> Integration for AirPurifierIntegration<T> {
    fn name(&self) -> &'static str {
        INTEGRATION_NAME
    }

    fn services(&self) -> Vec<ServiceDefinition> {
        CommandKind::ALL
            .into_iter()
            .map(CommandKind::definition)
            .collect()
    }

    async fn setup(&mut self) -> Result<Vec<DiscoveredDevice>, HubError> {
        let pending = std::mem::take(&mut self.pending);
        let mut discovered = Vec::with_capacity(pending.len());
        let mut last_error = None;

        for (config, transport) in pending {
            let (purifier, found) = match self.setup_device(config, transport).await {
                Ok(registered) => registered,
                Err(err) => {
                    tracing::error!(%err, "air purifier not registered");
                    last_error = Some(err);
                    continue;
                }
            };

            tracing::info!(
                entity_id = %purifier.entity_id(),
                model = ?found.device.model,
                "air purifier registered"
            );
            self.entities
                .insert(purifier.entity_id().to_string(), Mutex::new(purifier));
            discovered.push(found);
        }

        match last_error {
            Some(err) if discovered.is_empty() => Err(err.into()),
            _ => Ok(discovered),
        }
    }

    async fn update(&self) -> Vec<EntityUpdate> {
        let mut updates = Vec::with_capacity(self.entities.len());
        for (entity_id, purifier) in &self.entities {
            let mut purifier = purifier.lock().await;
            let result = match purifier.refresh().await {
                Ok(_) => purifier.to_entity(),
                Err(err) => Err(err.into()),
            };
            updates.push(EntityUpdate {
                entity_id: entity_id.clone(),
                result,
            });
        }
        updates
    }

    async fn handle_service_call(&self, call: &ServiceCall) -> Result<Vec<ServiceOutcome>, HubError> {
        if call.domain != DOMAIN {
            return Err(ValidationError::UnknownService {
                domain: call.domain.clone(),
                service: call.service.clone(),
            }
            .into());
        }
        let command = CommandKind::from_service(&call.service)?.parse(&call.data)?;

        let mut outcomes = Vec::new();
        for (entity_id, purifier) in &self.entities {
            if !call.targets(entity_id) {
                continue;
            }
            let result = run_command(entity_id, purifier, command).await;
            outcomes.push(ServiceOutcome {
                entity_id: entity_id.clone(),
                result: result.map_err(PurifierError::into_domain),
            });
        }

        let unknown: BTreeSet<&String> = call
            .entity_ids
            .iter()
            .flatten()
            .filter(|id| !self.entities.contains_key(id.as_str()))
            .collect();
        for id in unknown {
            outcomes.push(ServiceOutcome {
                entity_id: id.clone(),
                result: Err(NotFoundError {
                    entity: "Entity",
                    id: id.clone(),
                }
                .into()),
            });
        }

        Ok(outcomes)
    }

    async fn teardown(&mut self) -> Result<(), HubError> {
        tracing::info!(count = self.entities.len(), "air purifiers removed");
        self.entities.clear();
        self.pending.clear();
        Ok(())
    }
}
