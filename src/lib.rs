//! BoltLock controller library.
//!
//! Single-consumer event dispatch core of a door-lock device: the task
//! queue and its interrupt-context producers, the board UI state machines,
//! the bolt actuator and the credential store.  The network stack, data
//! model and persistence backend sit behind the port traits in
//! [`app::ports`].

#![deny(unused_must_use)]

pub mod app;
pub mod board;
pub mod config;
pub mod error;
pub mod events;
pub mod lock;
pub mod pins;
pub mod sensors;

pub mod adapters;
pub mod drivers;
