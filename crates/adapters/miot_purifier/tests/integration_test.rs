//! End-to-end tests driving the purifier integration through the app layer
//! over simulated devices.

use std::sync::Arc;
use std::time::Duration;

use airhub_adapter_miot_purifier::{
    AirPurifierIntegration, PropertyValue, PurifierConfig, PurifierError, SimulatedPurifier,
};
use airhub_app::coordinator::UpdateCoordinator;
use airhub_app::ports::Integration;
use airhub_app::services::service_registry::ServiceRegistry;
use airhub_domain::entity::{AttributeValue, EntityState};
use airhub_domain::error::{HubError, ValidationError};
use airhub_domain::service::ServiceCall;
use serde_json::json;
use tokio::sync::mpsc;

const TOKEN: &str = "ffeeddccbbaa99887766554433221100";

fn config(name: &str, host: &str) -> PurifierConfig {
    PurifierConfig {
        host: host.to_string(),
        token: TOKEN.to_string(),
        name: name.to_string(),
    }
}

async fn two_purifiers() -> (
    Arc<AirPurifierIntegration<SimulatedPurifier>>,
    SimulatedPurifier,
    SimulatedPurifier,
) {
    let living_room = SimulatedPurifier::new();
    let bedroom = SimulatedPurifier::new();
    let mut integration = AirPurifierIntegration::new()
        .with_device(config("Living Room", "192.168.1.20"), living_room.clone())
        .with_device(config("Bedroom", "192.168.1.21"), bedroom.clone());
    integration.setup().await.unwrap();
    (Arc::new(integration), living_room, bedroom)
}

#[tokio::test]
async fn should_keep_going_when_one_entity_fails_during_fan_out() {
    let (integration, living_room, bedroom) = two_purifiers().await;
    let registry = ServiceRegistry::register(Arc::clone(&integration));
    living_room.reject_writes(true);

    let call = ServiceCall::new("fan", "set_fan_level").data(json!({"fan_level": 3}));
    let outcomes = registry.call(&call).await.unwrap();
    assert_eq!(outcomes.len(), 2);

    let failed = outcomes
        .iter()
        .find(|o| o.entity_id == "fan.living_room")
        .unwrap();
    let Err(HubError::Integration(err)) = &failed.result else {
        panic!("expected integration error, got {:?}", failed.result);
    };
    assert!(
        err.downcast_ref::<PurifierError>()
            .is_some_and(PurifierError::is_unreachable)
    );

    let succeeded = outcomes
        .iter()
        .find(|o| o.entity_id == "fan.bedroom")
        .unwrap();
    assert!(succeeded.is_success());
    assert_eq!(bedroom.get("fan_level"), Some(PropertyValue::Int(3)));
    assert_eq!(integration.state("fan.bedroom").await.unwrap().fan_level, 3);
    assert_eq!(integration.state("fan.living_room").await.unwrap().fan_level, 1);
}

#[tokio::test]
async fn should_reject_unregistered_service_in_registry() {
    let (integration, living_room, _) = two_purifiers().await;
    let registry = ServiceRegistry::register(integration);

    let err = registry
        .call(&ServiceCall::new("light", "turn_on"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HubError::Validation(ValidationError::UnknownService { .. })
    ));
    assert!(living_room.writes().is_empty());
}

#[tokio::test]
async fn should_ignore_commands_for_purifier_that_is_off() {
    let (integration, living_room, bedroom) = two_purifiers().await;
    let registry = ServiceRegistry::register(Arc::clone(&integration));

    let off = ServiceCall::new("fan", "turn_off").target(["fan.bedroom"]);
    registry.call(&off).await.unwrap();

    let buzzer = ServiceCall::new("fan", "set_buzzer_off");
    let outcomes = registry.call(&buzzer).await.unwrap();
    assert!(outcomes.iter().all(|o| o.is_success()));

    assert_eq!(living_room.get("buzzer"), Some(PropertyValue::Int(0)));
    assert_eq!(bedroom.get("buzzer"), Some(PropertyValue::Int(50)));
    assert_eq!(bedroom.writes().len(), 1);
}

#[tokio::test]
async fn should_publish_refreshed_entities_from_coordinator() {
    let (integration, living_room, _) = two_purifiers().await;
    living_room.set("aqi", PropertyValue::Int(87));

    let (tx, mut rx) = mpsc::channel(8);
    let handle = UpdateCoordinator::start(Arc::clone(&integration), Duration::from_millis(10), tx);

    let mut seen = Vec::new();
    while seen.len() < 2 {
        seen.push(rx.recv().await.unwrap());
    }
    handle.abort();

    let living = seen
        .iter()
        .find(|e| e.entity_id == "fan.living_room")
        .unwrap();
    assert_eq!(living.state, EntityState::On);
    assert_eq!(living.get_attribute("aqi"), Some(&AttributeValue::Int(87)));
}
