//! Unified error types for the lock controller core.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! dispatch loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through handlers and outbound events without allocation.
//!
//! None of these are fatal at runtime: capacity and validation failures are
//! reported to the caller, queue overflow drops the task, hardware read
//! failures become sentinel readings.  Only start-up failures of the
//! surrounding stack stop the process, and those live at the binary edge.

use core::fmt;

use crate::lock::credentials::CredentialType;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A credential / user store operation was rejected.
    Store(StoreError),
    /// The task queue refused a post.
    Queue(QueueError),
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// A call into the external network / data-model stack failed.
    Stack(StackError),
    /// Configuration is invalid.
    Config(&'static str),
    /// Peripheral or stack initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Queue(e) => write!(f, "queue: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Stack(e) => write!(f, "stack: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Credential / user store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Index 0 or beyond the table capacity.
    IndexOutOfRange,
    /// User name longer than the stored maximum.
    NameTooLong,
    /// More credentials than a single user can reference.
    TooManyCredentials,
    /// The per-user table for one credential type is full.
    TypeCapacityExceeded(CredentialType),
    /// Secret longer than the per-slot buffer.
    SecretTooLong,
    /// Supplied secret matches no occupied credential.
    InvalidCredential,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange => write!(f, "index out of range"),
            Self::NameTooLong => write!(f, "user name too long"),
            Self::TooManyCredentials => write!(f, "too many credentials for one user"),
            Self::TypeCapacityExceeded(t) => write!(f, "per-user {t:?} capacity exceeded"),
            Self::SecretTooLong => write!(f, "credential secret too long"),
            Self::InvalidCredential => write!(f, "invalid credential"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Task queue errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Every slot is taken; the task was dropped.
    Full,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "task queue full"),
        }
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The driver reported a failed read.
    ReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// External stack errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Opening the commissioning window failed.
    CommissioningWindow,
    /// An attribute write was refused.
    AttributeUpdate,
    /// The software-update channel could not be started.
    SoftwareUpdate,
    /// The persistence delegate failed.
    Storage,
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommissioningWindow => write!(f, "commissioning window open failed"),
            Self::AttributeUpdate => write!(f, "attribute update failed"),
            Self::SoftwareUpdate => write!(f, "software update start failed"),
            Self::Storage => write!(f, "storage write failed"),
        }
    }
}

impl From<StackError> for Error {
    fn from(e: StackError) -> Self {
        Self::Stack(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
