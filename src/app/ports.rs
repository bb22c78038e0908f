//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (timers, indicators, network stack, data model, sensors,
//! storage, event sinks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware or the network stack directly.
//!
//! Calls into the network stack and data model are fire-and-forget from the
//! core's point of view: failures come back typed, get logged, and are not
//! retried.

use embassy_time::Duration;

use crate::config::DeviceConfig;
use crate::drivers::hw_timer::{TimerId, TimerMode};
use crate::drivers::led_patterns::Pattern;
use crate::error::{SensorError, StackError};
use crate::lock::bolt::OperationSource;
use crate::pins::Channel;
use crate::sensors::{MeasuredValue, MeasurementKind};

// ───────────────────────────────────────────────────────────────
// Timer port (domain → timer service)
// ───────────────────────────────────────────────────────────────

/// Software timers whose expiry is posted back as a `TimerEvent`.
///
/// Only called from task context.
pub trait TimerPort {
    /// (Re)start `id`.  Returns the generation the expiry event will carry;
    /// any earlier generation of the same timer is stale from now on.
    fn start(&mut self, id: TimerId, timeout: Duration, mode: TimerMode) -> u32;

    /// Stop `id`.  An expiry already in the queue is not retracted.
    fn cancel(&mut self, id: TimerId);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (domain → LEDs)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    /// Apply `pattern` to one channel, restarting its phase.
    fn set_indicator(&mut self, channel: Channel, pattern: Pattern);
}

// ───────────────────────────────────────────────────────────────
// Network stack port (domain → commissioning / update services)
// ───────────────────────────────────────────────────────────────

pub trait StackPort {
    /// Number of fabrics this device is commissioned into.
    fn fabric_count(&self) -> u8;

    /// Whether BLE commissioning advertising is already running.
    fn is_advertising(&self) -> bool;

    /// Open a commissioning window over BLE.
    fn open_commissioning_window(&mut self) -> Result<(), StackError>;

    /// Hand the destructive factory reset to the stack.  It runs after the
    /// current dispatch returns.
    fn schedule_factory_reset(&mut self);

    /// Enable the software-update channel (e.g. SMP over BLE).
    fn start_software_update(&mut self) -> Result<(), StackError>;
}

// ───────────────────────────────────────────────────────────────
// Attribute port (domain → data model)
// ───────────────────────────────────────────────────────────────

/// Externally visible lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAttribute {
    Locked,
    Unlocked,
    NotFullyLocked,
}

pub trait AttributePort {
    fn set_lock_state(
        &mut self,
        state: LockAttribute,
        source: OperationSource,
    ) -> Result<(), StackError>;

    fn set_measurement(&mut self, value: MeasuredValue) -> Result<(), StackError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (hardware → domain)
// ───────────────────────────────────────────────────────────────

pub trait SensorPort {
    /// Read one quantity in physical units (°C, %RH, kPa).
    fn sample(&mut self, kind: MeasurementKind) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists device configuration.
///
/// Implementations MUST validate before persisting.  Invalid values are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Returns [`DeviceConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<DeviceConfig, ConfigError>;

    fn save(&self, config: &DeviceConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ persistence delegate)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.  Durability is the backend's concern.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// Every driven port the dispatch loop needs, as one bound.
pub trait DevicePorts:
    TimerPort + IndicatorPort + StackPort + AttributePort + SensorPort + StoragePort
{
}

impl<T> DevicePorts for T where
    T: TimerPort + IndicatorPort + StackPort + AttributePort + SensorPort + StoragePort
{
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for crate::error::Error {
    fn from(_: StorageError) -> Self {
        Self::Stack(StackError::Storage)
    }
}
