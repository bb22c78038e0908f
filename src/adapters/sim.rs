//! Host simulation of the lock hardware and network stack.
//!
//! [`SimDevice`] implements every driven port so the full controller can
//! run on a workstation:
//!
//! | Port           | Simulation                                   |
//! |----------------|----------------------------------------------|
//! | TimerPort      | [`HostTimers`] threads                       |
//! | IndicatorPort  | [`PinIndicator`] over a logging output pin   |
//! | StackPort      | fabric / advertising flags, reset request    |
//! | AttributePort  | attribute writes go to the log               |
//! | SensorPort     | slowly drifting weather readings             |
//! | StoragePort    | [`NvsAdapter`]                               |
//!
//! State that the console thread needs to poke (commissioning, sensor
//! faults) lives in [`SimControls`], which is cheap to clone and shareable.

use core::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use embassy_time::Duration;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{info, trace, warn};

use crate::adapters::nvs::NvsAdapter;
use crate::app::ports::{
    AttributePort, IndicatorPort, LockAttribute, SensorPort, StackPort, StorageError, StoragePort,
    TimerPort,
};
use crate::drivers::hw_timer::{HostTimers, TimerId, TimerMode};
use crate::drivers::led_patterns::Pattern;
use crate::drivers::status_led::PinIndicator;
use crate::error::{SensorError, StackError};
use crate::events::{ConnectivityEvent, Event, TaskSender};
use crate::lock::bolt::OperationSource;
use crate::pins::{Channel, MAX_INDICATORS};
use crate::sensors::{MeasuredValue, MeasurementKind};

// ── Logging output pin ────────────────────────────────────────

/// Output pin that only reports its level.
pub struct LogPin {
    channel: Channel,
}

impl LogPin {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

impl ErrorType for LogPin {
    type Error = Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        trace!("LED{} off", self.channel);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        trace!("LED{} on", self.channel);
        Ok(())
    }
}

// ── Shared controls ───────────────────────────────────────────

/// Simulated stack state shared with the console thread.
#[derive(Clone, Default)]
pub struct SimControls {
    fabrics: Arc<AtomicU8>,
    advertising: Arc<AtomicBool>,
    sensor_fault: Arc<AtomicBool>,
}

impl SimControls {
    /// A controller finished commissioning.
    pub fn join_fabric(&self) {
        self.fabrics.fetch_add(1, Ordering::AcqRel);
        self.advertising.store(false, Ordering::Release);
    }

    pub fn set_advertising(&self, advertising: bool) {
        self.advertising.store(advertising, Ordering::Release);
    }

    pub fn set_sensor_fault(&self, fault: bool) {
        self.sensor_fault.store(fault, Ordering::Release);
    }

    fn clear(&self) {
        self.fabrics.store(0, Ordering::Release);
        self.advertising.store(false, Ordering::Release);
    }
}

// ── Device ────────────────────────────────────────────────────

pub struct SimDevice {
    timers: HostTimers,
    indicators: heapless::Vec<PinIndicator<LogPin>, MAX_INDICATORS>,
    storage: NvsAdapter,
    tx: TaskSender<'static, Event>,
    controls: SimControls,
    factory_reset: bool,
    samples: u32,
}

impl SimDevice {
    pub fn new(tx: TaskSender<'static, Event>, storage: NvsAdapter, indicator_count: u8) -> Self {
        let mut indicators = heapless::Vec::new();
        for ch in 0..indicator_count.min(MAX_INDICATORS as u8) {
            let Ok(indicator) = PinIndicator::new(LogPin::new(ch));
            // Capacity is MAX_INDICATORS and the loop is bounded by it.
            let _ = indicators.push(indicator);
        }
        Self {
            timers: HostTimers::new(tx.clone()),
            indicators,
            storage,
            tx,
            controls: SimControls::default(),
            factory_reset: false,
            samples: 0,
        }
    }

    pub fn controls(&self) -> SimControls {
        self.controls.clone()
    }

    /// Advance every indicator's blink phase.
    pub fn tick(&mut self, delta_ms: u32) {
        for indicator in &mut self.indicators {
            let Ok(()) = indicator.tick(delta_ms);
        }
    }

    pub fn indicator_lit(&self, channel: Channel) -> bool {
        self.indicators
            .get(channel as usize)
            .is_some_and(PinIndicator::is_lit)
    }

    /// Returns `true` once after the stack was asked for a factory reset.
    pub fn take_factory_reset(&mut self) -> bool {
        core::mem::take(&mut self.factory_reset)
    }

    /// Wipe persistent storage and decommission.
    pub fn factory_reset(&mut self) {
        self.storage.erase_all();
        self.controls.clear();
        for ch in 0..self.indicators.len() {
            self.set_indicator(ch as Channel, Pattern::Off);
        }
        warn!("SIM   | factory reset complete");
    }
}

impl TimerPort for SimDevice {
    fn start(&mut self, id: TimerId, timeout: Duration, mode: TimerMode) -> u32 {
        self.timers.start(id, timeout, mode)
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.cancel(id);
    }
}

impl IndicatorPort for SimDevice {
    fn set_indicator(&mut self, channel: Channel, pattern: Pattern) {
        if let Some(indicator) = self.indicators.get_mut(channel as usize) {
            if indicator.pattern() != pattern {
                info!("LED{} | {:?}", channel, pattern);
            }
            let Ok(()) = indicator.set_pattern(pattern);
        }
    }
}

impl StackPort for SimDevice {
    fn fabric_count(&self) -> u8 {
        self.controls.fabrics.load(Ordering::Acquire)
    }

    fn is_advertising(&self) -> bool {
        self.controls.advertising.load(Ordering::Acquire)
    }

    fn open_commissioning_window(&mut self) -> Result<(), StackError> {
        self.controls.set_advertising(true);
        self.tx
            .post(Event::Connectivity(ConnectivityEvent::BleAdvertisingChange {
                advertising: true,
                connections: 0,
            }))
            .map_err(|_| StackError::CommissioningWindow)
    }

    fn schedule_factory_reset(&mut self) {
        self.factory_reset = true;
    }

    fn start_software_update(&mut self) -> Result<(), StackError> {
        info!("SIM   | SMP service enabled");
        Ok(())
    }
}

impl AttributePort for SimDevice {
    fn set_lock_state(
        &mut self,
        state: LockAttribute,
        source: OperationSource,
    ) -> Result<(), StackError> {
        info!("ATTR  | LockState={:?} source={:?}", state, source);
        Ok(())
    }

    fn set_measurement(&mut self, value: MeasuredValue) -> Result<(), StackError> {
        trace!("ATTR  | MeasuredValue={:?}", value);
        Ok(())
    }
}

impl SensorPort for SimDevice {
    fn sample(&mut self, kind: MeasurementKind) -> Result<f32, SensorError> {
        if self.controls.sensor_fault.load(Ordering::Acquire) {
            return Err(SensorError::ReadFailed);
        }
        self.samples = self.samples.wrapping_add(1);
        let drift = (self.samples % 20) as f32 * 0.05;
        Ok(match kind {
            MeasurementKind::Temperature => 21.0 + drift,
            MeasurementKind::Humidity => 45.0 - drift,
            MeasurementKind::Pressure => 101.3 + drift / 10.0,
        })
    }
}

impl StoragePort for SimDevice {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.storage.read(namespace, key, buf)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write(namespace, key, data)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.storage.delete(namespace, key)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.storage.exists(namespace, key)
    }
}
