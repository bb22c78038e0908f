//! Long-press flow states.

/// Factory-reset progress.
///
/// `ArmedForReset` is entered when the function button has been held for
/// the trigger time and is left as soon as the cancel window opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionState {
    #[default]
    Idle,
    ArmedForReset,
    CancelWindowOpen,
}

/// What the running function timer will do if the button is still held
/// when it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldAction {
    /// Function button down; release first for a software update, hold on
    /// to arm factory reset.
    SoftwareUpdate,
    /// Advertising button down; hold on to open a commissioning window.
    Advertising,
}
