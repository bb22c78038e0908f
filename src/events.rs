//! Interrupt-driven task queue.
//!
//! Events are produced by:
//! - Button driver callbacks (debounced press / release edges)
//! - Timer expiry callbacks (function, actuator, measurement timers)
//! - The network stack (connectivity transitions)
//! - Remote control surfaces (lock / unlock / identify commands)
//!
//! Events are consumed by a single dispatch loop, strictly in posting order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Button ISR  │────▶│              │     │              │
//! │ Timer ISR   │────▶│  TaskQueue   │────▶│ Dispatch loop│
//! │ Net stack   │────▶│  (bounded)   │     │  (consumer)  │
//! │ Remote cmd  │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Producers only ever hold a [`TaskSender`], which can post and nothing
//! else.  Posting never blocks: a full queue drops the newest task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use futures_lite::future::block_on;
use log::error;

use crate::app::commands::AppCommand;
use crate::drivers::hw_timer::TimerEvent;
use crate::error::QueueError;
use crate::pins::ButtonId;

/// Maximum number of pending tasks.
pub const TASK_QUEUE_DEPTH: usize = 10;

// ── Event payloads ────────────────────────────────────────────

/// Debounced edge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Pressed,
    Released,
}

/// One debounced transition of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub action: ButtonAction,
}

/// Coarse connectivity transitions reported by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// BLE advertising started / stopped or a central connected.
    BleAdvertisingChange { advertising: bool, connections: u16 },
    /// Operational network provisioning or link state changed.
    NetworkChange { provisioned: bool, enabled: bool },
}

/// Everything the dispatch loop can be asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Button(ButtonEvent),
    Timer(TimerEvent),
    Connectivity(ConnectivityEvent),
    Command(AppCommand),
}

// ── Queue ─────────────────────────────────────────────────────

/// Bounded FIFO between interrupt-context producers and the single consumer.
pub struct TaskQueue<T, const N: usize = TASK_QUEUE_DEPTH> {
    channel: Channel<CriticalSectionRawMutex, T, N>,
}

impl<T, const N: usize> TaskQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue without blocking.  On a full queue the task is dropped.
    pub fn post(&self, task: T) -> Result<(), QueueError> {
        post_or_drop(self.channel.try_send(task).is_ok())
    }

    /// Producer handle for interrupt-context callers.
    pub fn sender(&self) -> TaskSender<'_, T, N> {
        TaskSender {
            inner: self.channel.sender(),
        }
    }

    /// Block until a task is available, then run `handler` on it.
    pub fn dispatch_next<R>(&self, handler: impl FnOnce(T) -> R) -> R {
        let task = block_on(self.channel.receive());
        handler(task)
    }

    /// Run `handler` on the next task if one is pending.
    pub fn try_dispatch_next(&self, handler: impl FnOnce(T)) -> bool {
        match self.channel.try_receive() {
            Ok(task) => {
                handler(task);
                true
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl<T, const N: usize> Default for TaskQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Post-only handle onto a [`TaskQueue`].
pub struct TaskSender<'a, T, const N: usize = TASK_QUEUE_DEPTH> {
    inner: Sender<'a, CriticalSectionRawMutex, T, N>,
}

impl<T, const N: usize> TaskSender<'_, T, N> {
    /// Enqueue without blocking.  On a full queue the task is dropped.
    pub fn post(&self, task: T) -> Result<(), QueueError> {
        post_or_drop(self.inner.try_send(task).is_ok())
    }
}

impl<T, const N: usize> Clone for TaskSender<'_, T, N> {
    fn clone(&self) -> Self {
        Self { inner: self.inner }
    }
}

fn post_or_drop(accepted: bool) -> Result<(), QueueError> {
    if accepted {
        Ok(())
    } else {
        error!("Failed to post event to task queue: queue full, task dropped");
        Err(QueueError::Full)
    }
}
