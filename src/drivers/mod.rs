//! Interrupt-context producers, timers and indicator output helpers.

pub mod button;
pub mod hw_timer;
pub mod led_patterns;
pub mod status_led;
