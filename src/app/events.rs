//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to a
//! companion app, record in a test, etc.

use crate::board::{DeviceState, FunctionState};
use crate::error::StoreError;
use crate::lock::bolt::{LockState, OperationSource};
use crate::sensors::MeasuredValue;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries the restored lock state).
    Started(LockState),

    /// The connectivity indicator machine moved.
    DeviceStateChanged { from: DeviceState, to: DeviceState },

    /// The long-press flow moved.
    FunctionStateChanged { from: FunctionState, to: FunctionState },

    /// The bolt started or finished a movement.
    LockStateChanged { state: LockState, source: OperationSource },

    /// The cancel window elapsed; the stack will wipe the device.
    FactoryResetScheduled,

    /// Short press on the function button.
    SoftwareUpdateRequested,

    /// A commissioning window was opened.
    AdvertisingStarted,

    /// A remote lock / unlock request failed the credential check, or a
    /// credential write was refused by the store.
    OperationRejected(StoreError),

    /// A periodic measurement was taken (possibly the invalid sentinel).
    Measurement(MeasuredValue),
}
