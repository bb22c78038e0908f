//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the lock controller:
//! event dispatch, lock actuation, credential checks and board UI.
//! All interaction with hardware and the network stack happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
