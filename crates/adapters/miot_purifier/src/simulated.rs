//! Simulated purifier — an in-memory [`MiotTransport`] for demos and tests.
//!
//! Holds one value per mapped property and applies writes to it, so a
//! refresh after a command observes the command's effect. Clones share the
//! same device, which lets a test keep a handle after moving the transport
//! into an adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TransportError;
use crate::property::PURIFIER_PRO_H;
use crate::transport::{MiotTransport, PropertyValue};

/// MIoT error code for an address the device does not implement.
const PROPERTY_NOT_FOUND: i64 = -4003;

/// A write the simulated device received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedWrite {
    pub service_id: u32,
    pub property_id: u32,
    pub value: PropertyValue,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<(u32, u32), PropertyValue>,
    writes: Vec<RecordedWrite>,
    reads: usize,
    offline: bool,
    reject_reads: bool,
    reject_writes: bool,
}

/// In-memory stand-in for an Air Purifier Pro H.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPurifier {
    inner: Arc<Mutex<Inner>>,
}

impl SimulatedPurifier {
    /// A powered-on purifier on fan level 1 in auto mode with clean air.
    #[must_use]
    pub fn new() -> Self {
        let purifier = Self::default();
        for (name, value) in [
            ("power", PropertyValue::Bool(true)),
            ("fan_level", PropertyValue::Int(1)),
            ("mode", PropertyValue::Int(0)),
            ("humidity", PropertyValue::Int(45)),
            ("temperature", PropertyValue::Float(22.4)),
            ("aqi", PropertyValue::Int(8)),
            ("filter_life_remaining", PropertyValue::Int(92)),
            ("filter_hours_used", PropertyValue::Int(283)),
            ("buzzer", PropertyValue::Int(50)),
            ("led_brightness", PropertyValue::Int(0)),
            ("child_lock", PropertyValue::Bool(false)),
            ("favorite_level", PropertyValue::Int(3)),
            ("set_favorite_rpm", PropertyValue::Int(780)),
            ("motor_speed", PropertyValue::Int(780)),
            ("use_time", PropertyValue::Int(1_018_800)),
            ("purify_volume", PropertyValue::Int(41_920)),
            ("average_aqi", PropertyValue::Int(11)),
        ] {
            purifier.set(name, value);
        }
        purifier
    }

    /// Overwrite a property as if the device changed it on its own.
    ///
    /// Names outside the property map are ignored.
    pub fn set(&self, name: &str, value: PropertyValue) {
        if let Ok(prop) = PURIFIER_PRO_H.lookup(name) {
            self.lock()
                .values
                .insert((prop.service_id, prop.property_id), value);
        }
    }

    /// Current value of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        let prop = PURIFIER_PRO_H.lookup(name).ok()?;
        self.lock()
            .values
            .get(&(prop.service_id, prop.property_id))
            .copied()
    }

    /// Every write received so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.lock().writes.clone()
    }

    /// Number of reads served so far.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    /// Make every request time out until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Make reads time out while writes keep working.
    pub fn reject_reads(&self, reject: bool) {
        self.lock().reject_reads = reject;
    }

    /// Make writes time out while reads keep working.
    pub fn reject_writes(&self, reject: bool) {
        self.lock().reject_writes = reject;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MiotTransport for SimulatedPurifier {
    async fn get_property(
        &self,
        service_id: u32,
        property_id: u32,
    ) -> Result<PropertyValue, TransportError> {
        let mut inner = self.lock();
        if inner.offline || inner.reject_reads {
            return Err(TransportError::Timeout);
        }
        inner.reads += 1;
        inner
            .values
            .get(&(service_id, property_id))
            .copied()
            .ok_or_else(|| TransportError::Device {
                code: PROPERTY_NOT_FOUND,
                message: format!("property {service_id}.{property_id} not found"),
            })
    }

    async fn set_property(
        &self,
        service_id: u32,
        property_id: u32,
        value: PropertyValue,
    ) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if inner.offline || inner.reject_writes {
            return Err(TransportError::Timeout);
        }
        inner.writes.push(RecordedWrite {
            service_id,
            property_id,
            value,
        });
        inner.values.insert((service_id, property_id), value);
        Ok(())
    }
}
