//! Single-channel indicator driver.
//!
//! Drives one LED from a [`Pattern`] through any `embedded-hal` output pin.
//! The owner calls [`PinIndicator::tick`] periodically with the elapsed
//! time; the pin is only written when the level actually changes.

use embedded_hal::digital::OutputPin;

use super::led_patterns::Pattern;

pub struct PinIndicator<P> {
    pin: P,
    pattern: Pattern,
    phase_ms: u32,
    level: bool,
}

impl<P: OutputPin> PinIndicator<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self {
            pin,
            pattern: Pattern::Off,
            phase_ms: 0,
            level: false,
        })
    }

    /// Switch pattern and restart its phase.
    pub fn set_pattern(&mut self, pattern: Pattern) -> Result<(), P::Error> {
        self.pattern = pattern;
        self.phase_ms = 0;
        self.apply()
    }

    /// Advance by `delta_ms`.
    pub fn tick(&mut self, delta_ms: u32) -> Result<(), P::Error> {
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);
        self.apply()
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn is_lit(&self) -> bool {
        self.level
    }

    pub fn release(self) -> P {
        self.pin
    }

    fn apply(&mut self) -> Result<(), P::Error> {
        let level = self.pattern.level(self.phase_ms);
        if level != self.level {
            if level {
                self.pin.set_high()?;
            } else {
                self.pin.set_low()?;
            }
            self.level = level;
        }
        Ok(())
    }
}
