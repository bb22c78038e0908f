//! Indicator patterns.
//!
//! A pattern is a pure function of time since it was applied:
//!
//! | Pattern              | Output                                  |
//! |----------------------|-----------------------------------------|
//! | `Off`                | always low                              |
//! | `On`                 | always high                             |
//! | `Blink { on, off }`  | high for `on` ms, low for `off` ms, ... |
//!
//! Every blink starts with its on-phase.

use crate::config::BlinkTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pattern {
    #[default]
    Off,
    On,
    Blink { on_ms: u32, off_ms: u32 },
}

impl Pattern {
    /// Symmetric blink with the given half-period.
    pub const fn blink(half_period_ms: u32) -> Self {
        Self::Blink {
            on_ms: half_period_ms,
            off_ms: half_period_ms,
        }
    }

    /// Solid on or off.
    pub const fn solid(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }

    /// Output level `phase_ms` after the pattern was applied.
    pub fn level(&self, phase_ms: u32) -> bool {
        match *self {
            Self::Off => false,
            Self::On => true,
            Self::Blink { on_ms, off_ms } => {
                let period = on_ms.saturating_add(off_ms);
                if period == 0 {
                    return false;
                }
                phase_ms % period < on_ms
            }
        }
    }
}

impl From<BlinkTiming> for Pattern {
    fn from(t: BlinkTiming) -> Self {
        Self::Blink {
            on_ms: t.on_ms,
            off_ms: t.off_ms,
        }
    }
}
