//! Bolt actuator state machine.
//!
//! ```text
//!                 lock()                       actuator timer
//!  UnlockingCompleted ──▶ LockingInitiated ─────────────────▶ LockingCompleted
//!          ▲                                                        │
//!          │ actuator timer                               unlock()  │
//!          └──────────── UnlockingInitiated ◀───────────────────────┘
//! ```
//!
//! `lock()` is a no-op only in `LockingCompleted` (and `unlock()` only in
//! `UnlockingCompleted`).  From any other state the request re-enters the
//! matching *Initiated* state and restarts the actuator timer, so a
//! movement can be reversed half-way.
//!
//! Every state change is returned to the caller as a [`LockTransition`]
//! carrying the operation source that requested the movement.  The owner
//! is the single subscriber and forwards it to indicators and attributes.

use embassy_time::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::app::ports::TimerPort;
use crate::drivers::hw_timer::{TimerEvent, TimerId, TimerMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    LockingInitiated,
    LockingCompleted,
    UnlockingInitiated,
    UnlockingCompleted,
}

impl LockState {
    pub fn is_completed(self) -> bool {
        matches!(self, Self::LockingCompleted | Self::UnlockingCompleted)
    }
}

/// Who asked for the movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationSource {
    #[default]
    Unspecified,
    Manual,
    Button,
    Remote,
    Keypad,
}

/// A state change, delivered once per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTransition {
    pub state: LockState,
    pub source: OperationSource,
}

pub struct LockManager {
    state: LockState,
    source: OperationSource,
    movement: Duration,
    /// Generation of the running actuator timer.
    timer: Option<u32>,
}

impl LockManager {
    /// Starts locked.
    pub fn new(movement: Duration) -> Self {
        Self::with_state(LockState::LockingCompleted, movement)
    }

    /// Resume from a persisted state.  A movement that was interrupted is
    /// treated as finished.
    pub fn with_state(state: LockState, movement: Duration) -> Self {
        let state = match state {
            LockState::LockingInitiated => LockState::LockingCompleted,
            LockState::UnlockingInitiated => LockState::UnlockingCompleted,
            s => s,
        };
        Self {
            state,
            source: OperationSource::Unspecified,
            movement,
            timer: None,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == LockState::LockingCompleted
    }

    /// True when the bolt is in, or moving towards, the locked position.
    pub fn is_locked_or_locking(&self) -> bool {
        matches!(
            self.state,
            LockState::LockingCompleted | LockState::LockingInitiated
        )
    }

    /// True when the bolt is in, or moving towards, the unlocked position.
    pub fn is_unlocked_or_unlocking(&self) -> bool {
        matches!(
            self.state,
            LockState::UnlockingCompleted | LockState::UnlockingInitiated
        )
    }

    pub fn lock(
        &mut self,
        source: OperationSource,
        timers: &mut impl TimerPort,
    ) -> Option<LockTransition> {
        if self.state == LockState::LockingCompleted {
            return None;
        }
        Some(self.begin(LockState::LockingInitiated, source, timers))
    }

    pub fn unlock(
        &mut self,
        source: OperationSource,
        timers: &mut impl TimerPort,
    ) -> Option<LockTransition> {
        if self.state == LockState::UnlockingCompleted {
            return None;
        }
        Some(self.begin(LockState::UnlockingInitiated, source, timers))
    }

    /// Finish the movement if `ev` belongs to the running actuator timer.
    pub fn on_actuator_timer(&mut self, ev: TimerEvent) -> Option<LockTransition> {
        if ev.id != TimerId::Actuator || self.timer != Some(ev.generation) {
            debug!("stale actuator expiry (gen {}) ignored", ev.generation);
            return None;
        }
        self.timer = None;

        let done = match self.state {
            LockState::LockingInitiated => LockState::LockingCompleted,
            LockState::UnlockingInitiated => LockState::UnlockingCompleted,
            _ => return None,
        };
        Some(self.set_state(done, self.source))
    }

    fn begin(
        &mut self,
        initiated: LockState,
        source: OperationSource,
        timers: &mut impl TimerPort,
    ) -> LockTransition {
        let transition = self.set_state(initiated, source);
        self.source = source;
        if self.timer.is_some() {
            timers.cancel(TimerId::Actuator);
        }
        self.timer = Some(timers.start(TimerId::Actuator, self.movement, TimerMode::OneShot));
        transition
    }

    fn set_state(&mut self, state: LockState, source: OperationSource) -> LockTransition {
        self.state = state;
        LockTransition { state, source }
    }
}
