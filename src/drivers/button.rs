//! Button edge producer.
//!
//! ## Hardware
//!
//! The input driver debounces the switches itself and reports two masks
//! from its interrupt handler: the current level of every button and the
//! bits that changed since the last report.  This module turns those masks
//! into one [`ButtonEvent`] per watched bit that changed and posts each one
//! by value.  It never looks at board or lock state.
//!
//! | Mask bit state | Changed | Event            |
//! |----------------|---------|------------------|
//! | 1              | 1       | `Pressed`        |
//! | 0              | 1       | `Released`       |
//! | any            | 0       | none             |

use crate::config::BoardLayout;
use crate::events::{ButtonAction, ButtonEvent, Event, TaskSender};
use crate::pins::{ButtonId, button_mask};

/// Set of buttons whose edges are forwarded to the task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonWatch {
    mask: u32,
}

impl ButtonWatch {
    pub fn new(buttons: &[ButtonId]) -> Self {
        let mask = buttons.iter().fold(0, |m, &b| m | button_mask(b));
        Self { mask }
    }

    /// Watch the function, application and advertising buttons.
    pub fn from_layout(layout: &BoardLayout) -> Self {
        Self::new(&[
            layout.function_button,
            layout.app_button,
            layout.advertising_button,
        ])
    }

    pub fn watches(&self, button: ButtonId) -> bool {
        self.mask & button_mask(button) != 0
    }

    /// Events for every watched bit in `changed`, lowest bit first.
    pub fn events(&self, state: u32, changed: u32) -> impl Iterator<Item = ButtonEvent> {
        let relevant = changed & self.mask;
        (0..32u8)
            .filter(move |bit| relevant & button_mask(*bit) != 0)
            .map(move |bit| ButtonEvent {
                button: bit,
                action: if state & button_mask(bit) != 0 {
                    ButtonAction::Pressed
                } else {
                    ButtonAction::Released
                },
            })
    }

    /// Interrupt-context entry point.  Returns the number of events the
    /// queue accepted; rejected ones were already logged by the queue.
    pub fn on_change<const N: usize>(
        &self,
        state: u32,
        changed: u32,
        tx: &TaskSender<'_, Event, N>,
    ) -> usize {
        self.events(state, changed)
            .filter(|ev| tx.post(Event::Button(*ev)).is_ok())
            .count()
    }
}
