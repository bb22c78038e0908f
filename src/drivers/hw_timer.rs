//! Software timer service.
//!
//! Timer expiry runs outside task context, so an expiry only builds a
//! [`TimerEvent`] and posts it.  Every `start` hands out a fresh generation
//! number carried in the event; a handler compares it with the generation
//! it stored and drops stale expiries (cancelling a timer never retracts an
//! event that is already queued).
//!
//! On the host, each started timer is a short-lived thread sleeping on an
//! `embassy-time` timer.  Cancelling bumps the generation so the thread
//! exits without posting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use embassy_time::{Duration, Timer};
use futures_lite::future::block_on;
use log::{debug, error};

use crate::app::ports::TimerPort;
use crate::events::{Event, TaskSender};

/// The timers the controller runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Long-press and advertising hold timer.
    Function,
    /// Bolt travel timer.
    Actuator,
    /// Periodic sensor sampling.
    Measurement,
}

impl TimerId {
    pub const COUNT: usize = 3;

    pub const fn index(self) -> usize {
        match self {
            Self::Function => 0,
            Self::Actuator => 1,
            Self::Measurement => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    OneShot,
    /// Re-arms automatically until cancelled.
    Periodic,
}

/// Expiry record posted by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub id: TimerId,
    /// Generation returned by the `start` call that armed this timer.
    pub generation: u32,
}

/// Thread-backed timers posting into the task queue.
pub struct HostTimers {
    tx: TaskSender<'static, Event>,
    generations: [Arc<AtomicU32>; TimerId::COUNT],
}

impl HostTimers {
    pub fn new(tx: TaskSender<'static, Event>) -> Self {
        Self {
            tx,
            generations: core::array::from_fn(|_| Arc::new(AtomicU32::new(0))),
        }
    }
}

impl TimerPort for HostTimers {
    fn start(&mut self, id: TimerId, timeout: Duration, mode: TimerMode) -> u32 {
        let current = Arc::clone(&self.generations[id.index()]);
        let generation = current.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        let tx = self.tx.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("timer-{id:?}"))
            .spawn(move || {
                loop {
                    block_on(Timer::after(timeout));
                    if current.load(Ordering::Acquire) != generation {
                        return;
                    }
                    // A full queue is logged by the queue itself.
                    let _ = tx.post(Event::Timer(TimerEvent { id, generation }));
                    if mode == TimerMode::OneShot {
                        return;
                    }
                }
            });
        match spawned {
            Ok(_) => debug!("timer {:?} started ({} ms, {:?})", id, timeout.as_millis(), mode),
            Err(e) => error!("timer {:?}: thread spawn failed: {}", id, e),
        }
        generation
    }

    fn cancel(&mut self, id: TimerId) {
        self.generations[id.index()].fetch_add(1, Ordering::AcqRel);
        debug!("timer {:?} cancelled", id);
    }
}
