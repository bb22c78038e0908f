//! Button and indicator assignments for the reference development board.
//!
//! Four momentary buttons (bit positions in the driver's state mask) and
//! four indicator LEDs.  Every assignment can be overridden through
//! [`BoardLayout`](crate::config::BoardLayout); these are the defaults.

/// Bit position of a button in the driver's state / change masks.
pub type ButtonId = u8;

/// Index of an indicator channel (one LED).
pub type Channel = u8;

/// Upper bound on indicator channels the board layer will drive.
pub const MAX_INDICATORS: usize = 4;

// ---------------------------------------------------------------------------
// Buttons (already debounced by the input driver)
// ---------------------------------------------------------------------------

/// Long-press button: software update on short press, factory reset on hold.
pub const FUNCTION_BUTTON: ButtonId = 0;
/// Lock / unlock toggle.
pub const APP_BUTTON: ButtonId = 1;
/// Hold to start BLE advertising for commissioning.
pub const ADVERTISING_BUTTON: ButtonId = 3;

/// Mask bit for a button id.
pub const fn button_mask(id: ButtonId) -> u32 {
    1u32 << id
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// Connectivity status indicator.
pub const STATUS_INDICATOR: Channel = 0;
/// Lock-state / identify indicator.
pub const APP_INDICATOR: Channel = 1;

/// Indicator channels fitted on the reference board.
pub const INDICATOR_COUNT: u8 = 4;
