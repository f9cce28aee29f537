//! Entity adapter — one air purifier exposed as a hub `fan` entity.
//!
//! [`AirPurifier`] owns the cached [`DeviceState`] of its device. A refresh
//! reads every polled property and replaces the cache only when all reads
//! succeed; commands validate their parameter, then write one property.

use std::collections::{BTreeMap, HashMap};

use airhub_domain::device::Device;
use airhub_domain::entity::{AttributeValue, Entity, EntityState};
use airhub_domain::error::HubError;
use airhub_domain::id::{DeviceId, EntityId};

use crate::command::{Command, CommandKind};
use crate::error::PurifierError;
use crate::property::PURIFIER_PRO_H;
use crate::state::{DeviceState, SPEED_ATTRIBUTE, Speed};
use crate::transport::MiotTransport;

const MANUFACTURER: &str = "Xiaomi";
const MODEL: &str = "zhimi.airpurifier.va1";
const ICON: &str = "mdi:air-purifier";
const ICON_ATTRIBUTE: &str = "icon";
const SPEED_LIST_ATTRIBUTE: &str = "speed_list";

/// Cached view of one purifier plus the transport used to reach it.
pub struct AirPurifier<T> {
    id: EntityId,
    device_id: DeviceId,
    name: String,
    entity_id: String,
    host: String,
    transport: T,
    state: Option<DeviceState>,
    on: bool,
    available: bool,
}

impl<T: MiotTransport> AirPurifier<T> {
    /// Create an adapter that has not talked to its device yet.
    pub fn new(name: impl Into<String>, host: impl Into<String>, transport: T) -> Self {
        let name = name.into();
        Self {
            id: EntityId::new(),
            device_id: DeviceId::new(),
            entity_id: format!("{}.{}", crate::DOMAIN, slugify(&name)),
            name,
            host: host.into(),
            transport,
            state: None,
            on: false,
            available: true,
        }
    }

    /// Override the generated entity id (used to resolve name clashes).
    #[must_use]
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = entity_id.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn icon(&self) -> &'static str {
        ICON
    }

    /// Named speeds in increasing fan level order.
    #[must_use]
    pub fn supported_speeds(&self) -> &'static [Speed] {
        &Speed::ALL
    }

    /// The last successfully refreshed state, if any.
    #[must_use]
    pub fn state(&self) -> Option<&DeviceState> {
        self.state.as_ref()
    }

    /// Read every polled property and replace the cached state.
    ///
    /// Reads are issued one property at a time. Any failure leaves the
    /// previous state untouched and marks the entity unavailable until the
    /// next successful refresh.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierError::DeviceUnreachable`] when a read fails and
    /// [`PurifierError::InvalidResponse`] when a value cannot be interpreted.
    pub async fn refresh(&mut self) -> Result<&DeviceState, PurifierError> {
        match self.read_state().await {
            Ok(state) => {
                self.on = state.power;
                self.available = true;
                Ok(self.state.insert(state))
            }
            Err(err) => {
                self.available = false;
                Err(err)
            }
        }
    }

    async fn read_state(&self) -> Result<DeviceState, PurifierError> {
        let available = PURIFIER_PRO_H.available();
        let mut readings = HashMap::with_capacity(available.len());
        for name in available {
            let prop = PURIFIER_PRO_H.lookup(name)?;
            let value = self
                .transport
                .get_property(prop.service_id, prop.property_id)
                .await
                .map_err(|source| PurifierError::DeviceUnreachable {
                    property: prop.name,
                    source,
                })?;
            readings.insert(prop.name, value);
        }
        DeviceState::from_readings(&readings)
    }

    /// Cached on/off flag; `false` until the first refresh.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Cached speed while on, `None` while off or never refreshed.
    #[must_use]
    pub fn current_speed(&self) -> Option<Speed> {
        if !self.on {
            return None;
        }
        self.state.as_ref().map(|state| state.speed)
    }

    /// Every polled property plus `speed`, null until the first refresh.
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<String, AttributeValue> {
        PURIFIER_PRO_H
            .available()
            .iter()
            .copied()
            .chain([SPEED_ATTRIBUTE])
            .map(|name| {
                let value = self
                    .state
                    .as_ref()
                    .and_then(|state| state.attribute(name))
                    .unwrap_or_default();
                (name.to_string(), value)
            })
            .collect()
    }

    /// Hub-level state: unknown before the first refresh, unavailable after
    /// a failed one.
    #[must_use]
    pub fn entity_state(&self) -> EntityState {
        if !self.available {
            EntityState::Unavailable
        } else if self.state.is_none() {
            EntityState::Unknown
        } else {
            EntityState::from(self.on)
        }
    }

    /// Snapshot for the hub.
    ///
    /// Carries the cached attributes plus the fan presentation: `speed` is
    /// the [current speed](Self::current_speed) (null while off),
    /// `speed_list` the supported speeds and `icon` the entity icon.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the name is empty.
    pub fn to_entity(&self) -> Result<Entity, HubError> {
        let speeds: Vec<&str> = self
            .supported_speeds()
            .iter()
            .copied()
            .map(Speed::as_str)
            .collect();
        Entity::builder()
            .id(self.id)
            .device_id(self.device_id)
            .entity_id(&self.entity_id)
            .friendly_name(&self.name)
            .state(self.entity_state())
            .attributes(self.attributes())
            .attribute(SPEED_ATTRIBUTE, self.current_speed().map(Speed::as_str).into())
            .attribute(SPEED_LIST_ATTRIBUTE, speeds.into())
            .attribute(ICON_ATTRIBUTE, self.icon().into())
            .build()
    }

    /// Device registry record.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the name is empty.
    pub fn device(&self) -> Result<Device, HubError> {
        Device::builder()
            .id(self.device_id)
            .name(&self.name)
            .manufacturer(MANUFACTURER)
            .model(MODEL)
            .integration(crate::INTEGRATION_NAME)
            .unique_id(&self.host)
            .build()
    }

    /// Validate and run the service named `service` with parameters `data`.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierError::UnknownService`] or
    /// [`PurifierError::InvalidParameter`] before any device interaction,
    /// or whatever [`execute`](Self::execute) returns.
    pub async fn call(&mut self, service: &str, data: &serde_json::Value) -> Result<(), PurifierError> {
        let command = CommandKind::from_service(service)?.parse(data)?;
        self.execute(command).await
    }

    /// Write a validated command to the device.
    ///
    /// Commands other than the power toggles are ignored while the cached
    /// state is off. The power toggles update the cached on/off flag as soon
    /// as the write succeeds; other commands show up on the next refresh.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierError::DeviceUnreachable`] when the write fails.
    pub async fn execute(&mut self, command: Command) -> Result<(), PurifierError> {
        let service = command.kind.service();
        if command.kind.requires_on() && !self.on {
            tracing::debug!(entity_id = %self.entity_id, service, "device is off, ignoring command");
            return Ok(());
        }

        let target = command.kind.target()?;
        self.transport
            .set_property(target.service_id, target.property_id, command.value)
            .await
            .map_err(|source| PurifierError::DeviceUnreachable {
                property: target.name,
                source,
            })?;

        tracing::debug!(
            entity_id = %self.entity_id,
            service,
            property = target.name,
            value = %command.value,
            "property written"
        );

        match command.kind {
            CommandKind::TurnOn => self.set_power(true),
            CommandKind::TurnOff => self.set_power(false),
            _ => {}
        }
        Ok(())
    }

    fn set_power(&mut self, on: bool) {
        self.on = on;
        if let Some(state) = self.state.as_mut() {
            state.power = on;
        }
    }
}

/// Lowercase `name`, collapsing every run of non-alphanumerics into `_`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("air_purifier");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::simulated::SimulatedPurifier;
    use crate::transport::PropertyValue;

    fn purifier() -> (AirPurifier<SimulatedPurifier>, SimulatedPurifier) {
        let device = SimulatedPurifier::new();
        let adapter = AirPurifier::new("Bedroom Purifier", "192.168.1.20", device.clone());
        (adapter, device)
    }

    async fn refreshed() -> (AirPurifier<SimulatedPurifier>, SimulatedPurifier) {
        let (mut adapter, device) = purifier();
        adapter.refresh().await.unwrap();
        (adapter, device)
    }

    #[test]
    fn should_slugify_names_into_entity_ids() {
        assert_eq!(slugify("Bedroom Purifier"), "bedroom_purifier");
        assert_eq!(slugify("  Xiaomi -- Pro H! "), "xiaomi_pro_h");
        assert_eq!(slugify("***"), "air_purifier");
    }

    #[test]
    fn should_start_unknown_and_off_with_null_attributes() {
        let (adapter, _) = purifier();
        assert_eq!(adapter.entity_id(), "fan.bedroom_purifier");
        assert_eq!(adapter.entity_state(), EntityState::Unknown);
        assert!(!adapter.is_on());
        assert_eq!(adapter.current_speed(), None);

        let attrs = adapter.attributes();
        assert_eq!(attrs.len(), PURIFIER_PRO_H.available().len() + 1);
        assert!(attrs.values().all(AttributeValue::is_null));
    }

    #[tokio::test]
    async fn should_read_each_polled_property_once_per_refresh() {
        let (mut adapter, device) = purifier();
        adapter.refresh().await.unwrap();
        assert_eq!(device.read_count(), PURIFIER_PRO_H.available().len());
    }

    #[tokio::test]
    async fn should_expose_read_fan_level_and_derived_speed() {
        let (mut adapter, device) = purifier();
        for (level, speed) in (0..=3).zip(Speed::ALL) {
            device.set("fan_level", PropertyValue::Int(level));
            adapter.refresh().await.unwrap();

            assert_eq!(
                adapter.attributes()["fan_level"],
                AttributeValue::Int(level)
            );
            assert_eq!(adapter.current_speed(), Some(speed));
        }
    }

    #[tokio::test]
    async fn should_hide_speed_while_off() {
        let (mut adapter, device) = purifier();
        device.set("power", PropertyValue::Bool(false));
        adapter.refresh().await.unwrap();

        assert!(!adapter.is_on());
        assert_eq!(adapter.current_speed(), None);
        assert_eq!(
            adapter.attributes()[SPEED_ATTRIBUTE],
            AttributeValue::String("low".to_string())
        );
    }

    #[tokio::test]
    async fn should_yield_identical_state_when_refreshing_unchanged_device() {
        let (mut adapter, _) = purifier();
        let first = adapter.refresh().await.unwrap().clone();
        let second = adapter.refresh().await.unwrap().clone();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn should_keep_last_known_state_when_refresh_fails() {
        let (mut adapter, device) = refreshed().await;
        let before = adapter.state().cloned();

        device.set("aqi", PropertyValue::Int(300));
        device.set_offline(true);
        let result = adapter.refresh().await;

        assert!(matches!(result, Err(PurifierError::DeviceUnreachable { .. })));
        assert_eq!(adapter.state().cloned(), before);
        assert_eq!(adapter.entity_state(), EntityState::Unavailable);
        assert!(adapter.is_on());

        device.set_offline(false);
        adapter.refresh().await.unwrap();
        assert_eq!(adapter.entity_state(), EntityState::On);
        assert_eq!(adapter.attributes()["aqi"], AttributeValue::Int(300));
    }

    #[tokio::test]
    async fn should_reject_fan_level_outside_known_speeds() {
        let (mut adapter, device) = refreshed().await;
        device.set("fan_level", PropertyValue::Int(5));

        let result = adapter.refresh().await;
        assert!(matches!(
            result,
            Err(PurifierError::InvalidResponse {
                property: "fan_level",
                ..
            })
        ));
        assert_eq!(adapter.state().unwrap().fan_level, 1);
    }

    #[tokio::test]
    async fn should_write_mode_once_for_every_valid_value_while_on() {
        for mode in 0..=3 {
            let (mut adapter, device) = refreshed().await;
            adapter.call("set_mode", &json!({"mode": mode})).await.unwrap();

            let writes = device.writes();
            assert_eq!(writes.len(), 1);
            assert_eq!((writes[0].service_id, writes[0].property_id), (2, 5));
            assert_eq!(writes[0].value, PropertyValue::Int(mode));
        }
    }

    #[tokio::test]
    async fn should_ignore_set_mode_while_off() {
        let (mut adapter, device) = purifier();
        device.set("power", PropertyValue::Bool(false));
        adapter.refresh().await.unwrap();

        adapter.call("set_mode", &json!({"mode": 2})).await.unwrap();
        assert!(device.writes().is_empty());
    }

    #[tokio::test]
    async fn should_reject_led_brightness_out_of_range_without_writing() {
        let (mut adapter, device) = refreshed().await;
        for brightness in [-1, 3, 7] {
            let result = adapter
                .call("set_led_brightness", &json!({"led_brightness": brightness}))
                .await;
            assert!(matches!(result, Err(PurifierError::InvalidParameter { .. })));
        }
        assert!(device.writes().is_empty());
    }

    #[tokio::test]
    async fn should_validate_favorite_level_boundaries() {
        let (mut adapter, device) = refreshed().await;

        let zero = adapter
            .call("set_favorite_level", &json!({"favorite_level": 0}))
            .await;
        assert!(matches!(zero, Err(PurifierError::InvalidParameter { .. })));

        adapter
            .call("set_favorite_level", &json!({"favorite_level": 10}))
            .await
            .unwrap();
        assert_eq!(device.get("favorite_level"), Some(PropertyValue::Int(10)));
    }

    #[tokio::test]
    async fn should_reflect_power_toggles_without_refresh() {
        let (mut adapter, device) = purifier();
        device.set("power", PropertyValue::Bool(false));
        adapter.refresh().await.unwrap();
        let reads = device.read_count();

        adapter.call("turn_on", &json!({})).await.unwrap();
        assert!(adapter.is_on());
        assert_eq!(adapter.attributes()["power"], AttributeValue::Bool(true));

        adapter.call("turn_off", &json!({})).await.unwrap();
        assert!(!adapter.is_on());
        assert_eq!(device.read_count(), reads);
    }

    #[tokio::test]
    async fn should_leave_cache_alone_for_other_commands() {
        let (mut adapter, device) = refreshed().await;
        adapter.call("set_fan_level", &json!({"fan_level": 3})).await.unwrap();

        assert_eq!(device.get("fan_level"), Some(PropertyValue::Int(3)));
        assert_eq!(adapter.state().unwrap().fan_level, 1);

        adapter.refresh().await.unwrap();
        assert_eq!(adapter.current_speed(), Some(Speed::High));
    }

    #[tokio::test]
    async fn should_surface_unreachable_on_failed_write() {
        let (mut adapter, device) = refreshed().await;
        device.reject_writes(true);

        let result = adapter.call("turn_off", &json!({})).await;
        assert!(matches!(
            result,
            Err(PurifierError::DeviceUnreachable {
                property: "power",
                ..
            })
        ));
        assert!(adapter.is_on());
    }

    #[tokio::test]
    async fn should_write_buzzer_and_child_lock_values() {
        let (mut adapter, device) = refreshed().await;
        adapter.call("set_buzzer_off", &json!({})).await.unwrap();
        adapter.call("set_child_lock_on", &json!({})).await.unwrap();

        assert_eq!(device.get("buzzer"), Some(PropertyValue::Int(0)));
        assert_eq!(device.get("child_lock"), Some(PropertyValue::Bool(true)));
    }

    #[tokio::test]
    async fn should_present_icon_and_speeds_on_hub_entity() {
        let (mut adapter, device) = refreshed().await;

        let entity = adapter.to_entity().unwrap();
        assert_eq!(
            entity.get_attribute("icon"),
            Some(&AttributeValue::String("mdi:air-purifier".to_string()))
        );
        assert_eq!(
            entity.get_attribute("speed_list"),
            Some(&AttributeValue::from(vec!["off", "low", "medium", "high"]))
        );
        assert_eq!(
            entity.get_attribute("speed"),
            Some(&AttributeValue::String("low".to_string()))
        );

        device.set("power", PropertyValue::Bool(false));
        adapter.refresh().await.unwrap();
        let entity = adapter.to_entity().unwrap();
        assert_eq!(entity.state, EntityState::Off);
        assert_eq!(entity.get_attribute("speed"), Some(&AttributeValue::Null));
        assert_eq!(
            entity.get_attribute("fan_level"),
            Some(&AttributeValue::Int(1))
        );
    }

    #[tokio::test]
    async fn should_build_hub_entity_and_device() {
        let (adapter, _) = refreshed().await;

        let entity = adapter.to_entity().unwrap();
        assert_eq!(entity.entity_id, "fan.bedroom_purifier");
        assert_eq!(entity.state, EntityState::On);
        assert_eq!(
            entity.get_attribute("temperature"),
            Some(&AttributeValue::Float(22.4))
        );

        let device = adapter.device().unwrap();
        assert_eq!(device.model.as_deref(), Some("zhimi.airpurifier.va1"));
        assert_eq!(device.unique_id.as_deref(), Some("192.168.1.20"));
        assert_eq!(entity.device_id, device.id);
    }
}
