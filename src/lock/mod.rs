//! Door lock: bolt actuator and credential storage.

pub mod bolt;
pub mod credentials;
