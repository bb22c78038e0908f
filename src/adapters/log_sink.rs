//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (serial console on target, stderr in the simulator).
//! A companion-app adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::MeasuredValue;

/// Adapter that logs every [`AppEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(lock) => {
                info!("START | lock={:?}", lock);
            }
            AppEvent::DeviceStateChanged { from, to } => {
                info!("STATE | device {:?} -> {:?}", from, to);
            }
            AppEvent::FunctionStateChanged { from, to } => {
                info!("STATE | function {:?} -> {:?}", from, to);
            }
            AppEvent::LockStateChanged { state, source } => {
                info!("LOCK  | {:?} (source={:?})", state, source);
            }
            AppEvent::FactoryResetScheduled => {
                warn!("RESET | factory reset scheduled");
            }
            AppEvent::SoftwareUpdateRequested => {
                info!("DFU   | software update channel requested");
            }
            AppEvent::AdvertisingStarted => {
                info!("BLE   | commissioning window opened");
            }
            AppEvent::OperationRejected(e) => {
                warn!("LOCK  | operation rejected: {}", e);
            }
            AppEvent::Measurement(value) => match value {
                v if v.is_invalid() => info!("MEAS  | {:?} invalid", v.kind()),
                MeasuredValue::Temperature(raw) => {
                    info!("MEAS  | T={}\u{00b0}C", fixed(i32::from(*raw), 2));
                }
                MeasuredValue::Humidity(raw) => {
                    info!("MEAS  | RH={}%", fixed(i32::from(*raw), 2));
                }
                MeasuredValue::Pressure(raw) => {
                    info!("MEAS  | P={}kPa", fixed(i32::from(*raw), 1));
                }
            },
        }
    }
}

/// Renders a fixed-point attribute value with `decimals` fractional digits.
fn fixed(raw: i32, decimals: u32) -> String {
    let scale = 10u32.pow(decimals);
    let sign = if raw < 0 { "-" } else { "" };
    let abs = raw.unsigned_abs();
    format!(
        "{}{}.{:0width$}",
        sign,
        abs / scale,
        abs % scale,
        width = decimals as usize
    )
}
