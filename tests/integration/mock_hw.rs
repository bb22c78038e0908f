//! Mock hardware adapter for integration tests.
//!
//! Records every port call so tests can assert on the full history without
//! threads or real timers.  Timers are manual: `start` hands out a
//! generation and [`MockHardware::expire`] builds the event that the timer
//! service would have posted.

use std::collections::HashMap;

use boltlock::app::events::AppEvent;
use boltlock::app::ports::{
    AttributePort, EventSink, IndicatorPort, LockAttribute, SensorPort, StackPort, StorageError,
    StoragePort, TimerPort,
};
use boltlock::drivers::hw_timer::{TimerEvent, TimerId, TimerMode};
use boltlock::drivers::led_patterns::Pattern;
use boltlock::error::{SensorError, StackError};
use boltlock::events::Event;
use boltlock::lock::bolt::OperationSource;
use boltlock::pins::Channel;
use boltlock::sensors::{MeasuredValue, MeasurementKind};
use embassy_time::Duration;

// ── Call records ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum StackCall {
    OpenCommissioningWindow,
    ScheduleFactoryReset,
    StartSoftwareUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmedTimer {
    pub generation: u32,
    pub timeout_ms: u64,
    pub mode: TimerMode,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    next_generation: u32,
    pub armed: HashMap<TimerId, ArmedTimer>,
    pub timer_starts: Vec<(TimerId, u64)>,
    pub indicators: HashMap<Channel, Pattern>,
    pub indicator_writes: Vec<(Channel, Pattern)>,
    pub stack_calls: Vec<StackCall>,
    pub fabrics: u8,
    pub advertising: bool,
    pub lock_attributes: Vec<(LockAttribute, OperationSource)>,
    pub measurements: Vec<MeasuredValue>,
    pub readings: HashMap<MeasurementKind, Result<f32, SensorError>>,
    pub fail_attributes: bool,
    pub store: HashMap<String, Vec<u8>>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        let readings = HashMap::from([
            (MeasurementKind::Temperature, Ok(21.5)),
            (MeasurementKind::Humidity, Ok(40.0)),
            (MeasurementKind::Pressure, Ok(101.3)),
        ]);
        Self {
            next_generation: 0,
            armed: HashMap::new(),
            timer_starts: Vec::new(),
            indicators: HashMap::new(),
            indicator_writes: Vec::new(),
            stack_calls: Vec::new(),
            fabrics: 0,
            advertising: false,
            lock_attributes: Vec::new(),
            measurements: Vec::new(),
            readings,
            fail_attributes: false,
            store: HashMap::new(),
        }
    }

    /// Expiry event of the currently armed `id`.  One-shot timers disarm.
    pub fn expire(&mut self, id: TimerId) -> Option<Event> {
        let armed = *self.armed.get(&id)?;
        if armed.mode == TimerMode::OneShot {
            self.armed.remove(&id);
        }
        Some(Event::Timer(TimerEvent {
            id,
            generation: armed.generation,
        }))
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.armed.contains_key(&id)
    }

    pub fn indicator(&self, channel: Channel) -> Pattern {
        self.indicators.get(&channel).copied().unwrap_or_default()
    }

    pub fn count(&self, call: &StackCall) -> usize {
        self.stack_calls.iter().filter(|c| *c == call).count()
    }

    pub fn last_lock_attribute(&self) -> Option<LockAttribute> {
        self.lock_attributes.last().map(|(a, _)| *a)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerPort for MockHardware {
    fn start(&mut self, id: TimerId, timeout: Duration, mode: TimerMode) -> u32 {
        self.next_generation += 1;
        let timeout_ms = timeout.as_millis();
        self.armed.insert(
            id,
            ArmedTimer {
                generation: self.next_generation,
                timeout_ms,
                mode,
            },
        );
        self.timer_starts.push((id, timeout_ms));
        self.next_generation
    }

    fn cancel(&mut self, id: TimerId) {
        self.armed.remove(&id);
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, channel: Channel, pattern: Pattern) {
        self.indicators.insert(channel, pattern);
        self.indicator_writes.push((channel, pattern));
    }
}

impl StackPort for MockHardware {
    fn fabric_count(&self) -> u8 {
        self.fabrics
    }

    fn is_advertising(&self) -> bool {
        self.advertising
    }

    fn open_commissioning_window(&mut self) -> Result<(), StackError> {
        self.stack_calls.push(StackCall::OpenCommissioningWindow);
        self.advertising = true;
        Ok(())
    }

    fn schedule_factory_reset(&mut self) {
        self.stack_calls.push(StackCall::ScheduleFactoryReset);
    }

    fn start_software_update(&mut self) -> Result<(), StackError> {
        self.stack_calls.push(StackCall::StartSoftwareUpdate);
        Ok(())
    }
}

impl AttributePort for MockHardware {
    fn set_lock_state(
        &mut self,
        state: LockAttribute,
        source: OperationSource,
    ) -> Result<(), StackError> {
        if self.fail_attributes {
            return Err(StackError::AttributeUpdate);
        }
        self.lock_attributes.push((state, source));
        Ok(())
    }

    fn set_measurement(&mut self, value: MeasuredValue) -> Result<(), StackError> {
        if self.fail_attributes {
            return Err(StackError::AttributeUpdate);
        }
        self.measurements.push(value);
        Ok(())
    }
}

impl SensorPort for MockHardware {
    fn sample(&mut self, kind: MeasurementKind) -> Result<f32, SensorError> {
        self.readings
            .get(&kind)
            .copied()
            .unwrap_or(Err(SensorError::ReadFailed))
    }
}

impl StoragePort for MockHardware {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&format!("{}::{}", namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── Recording sink ────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn take(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
