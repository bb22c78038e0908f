//! Device configuration parameters
//!
//! All tunable timings and the board layout for the lock controller.
//! Values can be overridden via the persistent store or a JSON file given
//! to the host simulator.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins::{self, ButtonId, MAX_INDICATORS};

// ---------------------------------------------------------------------------
// Store capacities (compile-time, backing arrays are fixed-size)
// ---------------------------------------------------------------------------

/// Users the credential store can hold.
pub const MAX_USERS: usize = 10;
/// Credential slots per credential type.
pub const MAX_CREDENTIALS_PER_TYPE: usize = 10;
/// Credentials of one type a single user may reference.
pub const MAX_CREDENTIALS_PER_USER_PER_TYPE: usize = 2;
/// Credentials of any type a single user may reference.
pub const MAX_CREDENTIALS_PER_USER: usize = 6;
/// Bytes of user name kept per record.
pub const MAX_USER_NAME_LEN: usize = 10;
/// Bytes of secret kept per credential slot.
pub const MAX_CREDENTIAL_LEN: usize = 32;

/// On / off durations of a blinking indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkTiming {
    pub on_ms: u32,
    pub off_ms: u32,
}

impl BlinkTiming {
    pub const fn new(on_ms: u32, off_ms: u32) -> Self {
        Self { on_ms, off_ms }
    }
}

/// Which physical button and indicator does what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    /// Long-press button (software update / factory reset).
    pub function_button: ButtonId,
    /// Lock toggle button.
    pub app_button: ButtonId,
    /// Advertising button.  May equal `function_button` on single-button
    /// boards, in which case advertising starts on press without a timer.
    pub advertising_button: ButtonId,
    /// Number of indicator channels driven (1..=4).
    pub indicator_count: u8,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            function_button: pins::FUNCTION_BUTTON,
            app_button: pins::APP_BUTTON,
            advertising_button: pins::ADVERTISING_BUTTON,
            indicator_count: pins::INDICATOR_COUNT,
        }
    }
}

impl BoardLayout {
    /// True when advertising shares the function button.
    pub fn shared_advertising_button(&self) -> bool {
        self.advertising_button == self.function_button
    }
}

/// Core device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Long-press flow ---
    /// Hold time before factory reset is armed (T1).
    pub factory_reset_trigger_ms: u32,
    /// Window in which a release cancels the armed reset (T2).
    pub factory_reset_cancel_window_ms: u32,
    /// Hold time on the advertising button (T3).
    pub advertising_trigger_ms: u32,

    // --- Actuator ---
    /// Simulated bolt travel time.
    pub actuator_movement_ms: u32,

    // --- Indication ---
    /// Half-period of the all-channel factory-reset alert blink.
    pub alert_blink_ms: u32,
    /// Half-period of the identify blink.
    pub identify_blink_ms: u32,
    /// Half-period of the blink shown while the bolt moves.
    pub lock_moving_blink_ms: u32,
    /// Status blink while disconnected.
    pub disconnected_blink: BlinkTiming,
    /// Status blink while a BLE central is connected.
    pub ble_connected_blink: BlinkTiming,

    // --- Measurements ---
    /// Sensor sampling period, 0 disables sampling.
    pub measurement_interval_ms: u32,

    // --- Board ---
    pub layout: BoardLayout,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // Long-press
            factory_reset_trigger_ms: 3000,
            factory_reset_cancel_window_ms: 3000,
            advertising_trigger_ms: 3000,

            // Actuator
            actuator_movement_ms: 2000,

            // Indication
            alert_blink_ms: 500,
            identify_blink_ms: 500,
            lock_moving_blink_ms: 50,
            disconnected_blink: BlinkTiming::new(50, 950),
            ble_connected_blink: BlinkTiming::new(100, 100),

            // Measurements
            measurement_interval_ms: 3000,

            layout: BoardLayout::default(),
        }
    }
}

impl DeviceConfig {
    /// Reject values the controller cannot run with.
    ///
    /// Ranges are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.factory_reset_trigger_ms == 0 {
            return Err(Error::Config("factory_reset_trigger_ms must be non-zero"));
        }
        if self.factory_reset_cancel_window_ms == 0 {
            return Err(Error::Config("factory_reset_cancel_window_ms must be non-zero"));
        }
        if self.advertising_trigger_ms == 0 {
            return Err(Error::Config("advertising_trigger_ms must be non-zero"));
        }
        if self.actuator_movement_ms == 0 {
            return Err(Error::Config("actuator_movement_ms must be non-zero"));
        }
        if self.alert_blink_ms == 0 || self.identify_blink_ms == 0 || self.lock_moving_blink_ms == 0
        {
            return Err(Error::Config("blink periods must be non-zero"));
        }
        let count = self.layout.indicator_count as usize;
        if count == 0 || count > MAX_INDICATORS {
            return Err(Error::Config("indicator_count must be within 1..=4"));
        }
        if self.layout.function_button == self.layout.app_button {
            return Err(Error::Config("function and application buttons must differ"));
        }
        if self.layout.function_button >= 32
            || self.layout.app_button >= 32
            || self.layout.advertising_button >= 32
        {
            return Err(Error::Config("button ids must fit the 32-bit state mask"));
        }
        Ok(())
    }
}
