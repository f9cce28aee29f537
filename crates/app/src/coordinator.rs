//! Update coordinator — polls an integration on a fixed interval.
//!
//! Each tick refreshes every entity the integration owns. Fresh snapshots
//! are forwarded through a channel; failures are logged and the loop keeps
//! going, leaving retry policy to the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use airhub_domain::entity::Entity;

use crate::ports::Integration;

/// Background poller for one integration.
pub struct UpdateCoordinator<I> {
    integration: Arc<I>,
    interval: Duration,
    updates: mpsc::Sender<Entity>,
}

impl<I: Integration + 'static> UpdateCoordinator<I> {
    /// Spawn the polling loop. Abort the returned handle to stop it.
    pub fn start(
        integration: Arc<I>,
        interval: Duration,
        updates: mpsc::Sender<Entity>,
    ) -> JoinHandle<()> {
        let coordinator = Self {
            integration,
            interval,
            updates,
        };

        tokio::spawn(coordinator.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.iterate().await.is_err() {
                tracing::debug!("update receiver dropped, stopping coordinator");
                return;
            }
        }
    }

    /// Run a single polling round and return how many entities failed.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` once the receiving side of the update channel is
    /// gone, which ends the loop.
    async fn iterate(&self) -> Result<usize, ()> {
        let mut failed = 0;
        for update in self.integration.update().await {
            match update.result {
                Ok(entity) => {
                    tracing::trace!(entity_id = %update.entity_id, state = %entity.state, "entity refreshed");
                    self.updates.send(entity).await.map_err(|_| ())?;
                }
                Err(err) => {
                    failed += 1;
                    tracing::warn!(
                        entity_id = %update.entity_id,
                        %err,
                        "refresh failed, retrying next interval"
                    );
                }
            }
        }
        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use airhub_domain::entity::EntityState;
    use airhub_domain::error::{HubError, NotFoundError};
    use airhub_domain::service::{ServiceCall, ServiceDefinition, ServiceOutcome};

    use crate::ports::{DiscoveredDevice, EntityUpdate};

    #[derive(Default)]
    struct PollCounter {
        polls: AtomicUsize,
    }

    impl Integration for PollCounter {
        fn name(&self) -> &'static str {
            "poll_counter"
        }

        fn services(&self) -> Vec<ServiceDefinition> {
            Vec::new()
        }

        async fn setup(&mut self) -> Result<Vec<DiscoveredDevice>, HubError> {
            Ok(Vec::new())
        }

        async fn update(&self) -> Vec<EntityUpdate> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let ok = Entity::builder()
                .entity_id("fan.bedroom")
                .friendly_name("Bedroom")
                .state(EntityState::On)
                .build();
            vec![
                EntityUpdate {
                    entity_id: "fan.bedroom".to_string(),
                    result: ok,
                },
                EntityUpdate {
                    entity_id: "fan.attic".to_string(),
                    result: Err(NotFoundError {
                        entity: "Entity",
                        id: "fan.attic".to_string(),
                    }
                    .into()),
                },
            ]
        }

        async fn handle_service_call(
            &self,
            _call: &ServiceCall,
        ) -> Result<Vec<ServiceOutcome>, HubError> {
            Ok(Vec::new())
        }

        async fn teardown(&mut self) -> Result<(), HubError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn should_forward_successful_refreshes_and_count_failures() {
        let (tx, mut rx) = mpsc::channel(4);
        let coordinator = UpdateCoordinator {
            integration: Arc::new(PollCounter::default()),
            interval: Duration::from_secs(60),
            updates: tx,
        };

        let failed = coordinator.iterate().await.unwrap();
        assert_eq!(failed, 1);

        let entity = rx.recv().await.unwrap();
        assert_eq!(entity.entity_id, "fan.bedroom");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_stop_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let integration = Arc::new(PollCounter::default());

        let handle =
            UpdateCoordinator::start(Arc::clone(&integration), Duration::from_millis(10), tx);
        handle.await.unwrap();

        assert_eq!(integration.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_poll_until_aborted() {
        let (tx, mut rx) = mpsc::channel(16);
        let integration = Arc::new(PollCounter::default());

        let handle =
            UpdateCoordinator::start(Arc::clone(&integration), Duration::from_millis(5), tx);
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        handle.abort();

        assert!(integration.polls.load(Ordering::SeqCst) >= 2);
    }
}
