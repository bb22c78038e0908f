//! Board UI: connectivity indication and the function-button flows.
//!
//! ```text
//!            press (T1 started)         T1 expires
//!   Idle ─────────────────────▶ Idle ──────────────▶ ArmedForReset
//!    ▲   release before T1:        (hold)                 │ alert blink on
//!    │   software update                                  │ every channel,
//!    │                                                    ▼ T2 started
//!    ├────────────── release (cancelled) ─────── CancelWindowOpen
//!    │                                                    │
//!    └──────────────── T2 expires: factory reset ─────────┘
//! ```
//!
//! One function timer serves both the long-press flow and the advertising
//! hold.  A new hold only starts while that timer is idle and the flow is
//! in `Idle`.  Expiries are matched against the generation of the running
//! timer, so an expiry that was queued before a cancel is ignored.
//!
//! The status indicator follows [`DeviceState`].  Every state change first
//! resets all channels, then applies the new pattern and re-applies the
//! application indicator overlay.  While the factory-reset alert blink is
//! showing, indication updates are deferred until the flow returns to
//! `Idle`.

mod device_state;
mod function;

pub use device_state::DeviceState;
pub use function::{FunctionState, HeldAction};

use embassy_time::Duration;
use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, IndicatorPort, StackPort, TimerPort};
use crate::config::DeviceConfig;
use crate::drivers::hw_timer::{TimerEvent, TimerId, TimerMode};
use crate::drivers::led_patterns::Pattern;
use crate::events::{ButtonAction, ButtonEvent, ConnectivityEvent};
use crate::pins::{APP_INDICATOR, Channel, MAX_INDICATORS, STATUS_INDICATOR};

pub struct Board {
    config: DeviceConfig,
    device_state: DeviceState,
    function: FunctionState,
    hold: Option<HeldAction>,
    /// Generation of the running function timer.
    function_timer: Option<u32>,
    /// Pattern the application wants on its indicator.
    app_indication: Pattern,
    channels: [Pattern; MAX_INDICATORS],
    resets: u32,
}

impl Board {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            config: config.clone(),
            device_state: DeviceState::Disconnected,
            function: FunctionState::Idle,
            hold: None,
            function_timer: None,
            app_indication: Pattern::Off,
            channels: [Pattern::Off; MAX_INDICATORS],
            resets: 0,
        }
    }

    /// Drive every channel to its initial pattern.
    pub fn start(&mut self, hw: &mut impl IndicatorPort) {
        self.reset_all(hw);
        self.apply_indication(hw);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn device_state(&self) -> DeviceState {
        self.device_state
    }

    pub fn function_state(&self) -> FunctionState {
        self.function
    }

    pub fn function_timer_active(&self) -> bool {
        self.function_timer.is_some()
    }

    /// Last pattern written to `channel`.
    pub fn indicator(&self, channel: Channel) -> Pattern {
        self.channels
            .get(channel as usize)
            .copied()
            .unwrap_or(Pattern::Off)
    }

    /// How many times all channels were reset.
    pub fn indicator_resets(&self) -> u32 {
        self.resets
    }

    // ── Buttons ───────────────────────────────────────────────

    pub fn on_button(
        &mut self,
        ev: ButtonEvent,
        hw: &mut (impl TimerPort + IndicatorPort + StackPort),
        sink: &mut impl EventSink,
    ) {
        let layout = self.config.layout;
        if ev.button == layout.advertising_button {
            self.advertising_button(ev.action, hw, sink);
        }
        if ev.button == layout.function_button {
            self.function_button(ev.action, hw, sink);
        }
    }

    fn function_button(
        &mut self,
        action: ButtonAction,
        hw: &mut (impl TimerPort + IndicatorPort + StackPort),
        sink: &mut impl EventSink,
    ) {
        match action {
            ButtonAction::Pressed => {
                if self.hold_allowed() {
                    self.hold = Some(HeldAction::SoftwareUpdate);
                    self.start_function_timer(self.config.factory_reset_trigger_ms, hw);
                }
            }
            ButtonAction::Released => {
                if self.function_timer.is_none() {
                    return;
                }
                if self.hold == Some(HeldAction::SoftwareUpdate) {
                    self.cancel_function_timer(hw);
                    self.hold = None;
                    match hw.start_software_update() {
                        Ok(()) => {
                            info!("Software update channel enabled");
                            sink.emit(&AppEvent::SoftwareUpdateRequested);
                        }
                        Err(e) => warn!("Software update not started: {}", e),
                    }
                } else if self.function == FunctionState::CancelWindowOpen {
                    self.cancel_function_timer(hw);
                    self.set_function(FunctionState::Idle, sink);
                    self.reset_all(hw);
                    self.apply_indication(hw);
                    info!("Factory reset has been cancelled");
                }
            }
        }
    }

    fn advertising_button(
        &mut self,
        action: ButtonAction,
        hw: &mut (impl TimerPort + IndicatorPort + StackPort),
        sink: &mut impl EventSink,
    ) {
        if self.config.layout.shared_advertising_button() {
            if action == ButtonAction::Pressed {
                start_advertising(hw, sink);
            }
            return;
        }
        match action {
            ButtonAction::Pressed => {
                if self.hold_allowed() {
                    self.hold = Some(HeldAction::Advertising);
                    self.start_function_timer(self.config.advertising_trigger_ms, hw);
                }
            }
            ButtonAction::Released => {
                if self.hold == Some(HeldAction::Advertising) && self.function_timer.is_some() {
                    self.cancel_function_timer(hw);
                    self.hold = None;
                }
            }
        }
    }

    // ── Function timer ────────────────────────────────────────

    pub fn on_function_timer(
        &mut self,
        ev: TimerEvent,
        hw: &mut (impl TimerPort + IndicatorPort + StackPort),
        sink: &mut impl EventSink,
    ) {
        if ev.id != TimerId::Function || self.function_timer != Some(ev.generation) {
            debug!("stale function timer expiry (gen {}) ignored", ev.generation);
            return;
        }
        self.function_timer = None;

        match (self.function, self.hold.take()) {
            (FunctionState::Idle, Some(HeldAction::SoftwareUpdate)) => {
                self.set_function(FunctionState::ArmedForReset, sink);
                info!(
                    "Factory reset has been triggered. Release button within {}ms to cancel.",
                    self.config.factory_reset_cancel_window_ms
                );
                self.start_function_timer(self.config.factory_reset_cancel_window_ms, hw);
                self.reset_all(hw);
                let alert = Pattern::blink(self.config.alert_blink_ms);
                for ch in 0..self.config.layout.indicator_count {
                    self.write(hw, ch, alert);
                }
                self.set_function(FunctionState::CancelWindowOpen, sink);
            }
            (FunctionState::CancelWindowOpen, _) => {
                self.set_function(FunctionState::Idle, sink);
                warn!("Factory reset scheduled");
                hw.schedule_factory_reset();
                sink.emit(&AppEvent::FactoryResetScheduled);
            }
            (FunctionState::Idle, Some(HeldAction::Advertising)) => {
                start_advertising(hw, sink);
            }
            (state, hold) => {
                debug!("function timer expired in {:?} with {:?}, nothing to do", state, hold);
            }
        }
    }

    // ── Device state ──────────────────────────────────────────

    pub fn on_connectivity(
        &mut self,
        ev: ConnectivityEvent,
        hw: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) {
        if let Some(next) = self.device_state.next(ev) {
            self.update_device_state(next, hw, sink);
        }
    }

    /// Only a real change touches the indicators.
    pub fn update_device_state(
        &mut self,
        state: DeviceState,
        hw: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) {
        if state == self.device_state {
            return;
        }
        let from = self.device_state;
        self.device_state = state;
        sink.emit(&AppEvent::DeviceStateChanged { from, to: state });

        if self.alert_showing() {
            return;
        }
        self.reset_all(hw);
        self.apply_indication(hw);
    }

    /// Set the application indicator overlay.
    pub fn set_app_indication(&mut self, pattern: Pattern, hw: &mut impl IndicatorPort) {
        self.app_indication = pattern;
        if !self.alert_showing() && self.config.layout.indicator_count > APP_INDICATOR {
            self.write(hw, APP_INDICATOR, pattern);
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn hold_allowed(&self) -> bool {
        self.function_timer.is_none() && self.function == FunctionState::Idle && self.hold.is_none()
    }

    fn alert_showing(&self) -> bool {
        self.function == FunctionState::CancelWindowOpen
    }

    fn start_function_timer(&mut self, timeout_ms: u32, hw: &mut impl TimerPort) {
        let generation = hw.start(
            TimerId::Function,
            Duration::from_millis(timeout_ms as u64),
            TimerMode::OneShot,
        );
        self.function_timer = Some(generation);
    }

    fn cancel_function_timer(&mut self, hw: &mut impl TimerPort) {
        hw.cancel(TimerId::Function);
        self.function_timer = None;
    }

    fn set_function(&mut self, to: FunctionState, sink: &mut impl EventSink) {
        let from = self.function;
        self.function = to;
        sink.emit(&AppEvent::FunctionStateChanged { from, to });
    }

    fn reset_all(&mut self, hw: &mut impl IndicatorPort) {
        for ch in 0..self.config.layout.indicator_count {
            self.write(hw, ch, Pattern::Off);
        }
        self.resets += 1;
    }

    fn apply_indication(&mut self, hw: &mut impl IndicatorPort) {
        let status = self.device_state.status_pattern(&self.config);
        self.write(hw, STATUS_INDICATOR, status);
        if self.config.layout.indicator_count > APP_INDICATOR {
            self.write(hw, APP_INDICATOR, self.app_indication);
        }
    }

    fn write(&mut self, hw: &mut impl IndicatorPort, channel: Channel, pattern: Pattern) {
        if let Some(slot) = self.channels.get_mut(channel as usize) {
            *slot = pattern;
            hw.set_indicator(channel, pattern);
        }
    }
}

/// Open a commissioning window unless the device is already commissioned
/// or advertising.
fn start_advertising(hw: &mut impl StackPort, sink: &mut impl EventSink) {
    if hw.fabric_count() != 0 {
        info!("BLE advertising not started - device is already commissioned");
        return;
    }
    if hw.is_advertising() {
        info!("BLE advertising is already enabled");
        return;
    }
    match hw.open_commissioning_window() {
        Ok(()) => sink.emit(&AppEvent::AdvertisingStarted),
        Err(e) => error!("Opening commissioning window failed: {}", e),
    }
}
