//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the board UI, the bolt actuator and the credential
//! store.  It is the single consumer of the task queue: every event is
//! matched exhaustively in [`AppService::handle`].  All I/O flows through
//! port traits injected at call sites, making the entire service testable
//! with mock adapters.
//!
//! ```text
//!  TaskQueue ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                │       AppService        │
//!  DevicePorts ◀─│ Board · Lock · Store    │
//!                └────────────────────────┘
//! ```

use embassy_time::Duration;
use log::{info, warn};

use crate::board::Board;
use crate::config::DeviceConfig;
use crate::drivers::hw_timer::{TimerEvent, TimerId, TimerMode};
use crate::drivers::led_patterns::Pattern;
use crate::error::{Error, Result, StackError};
use crate::events::{ButtonAction, ButtonEvent, Event, TaskQueue};
use crate::lock::bolt::{LockManager, LockState, LockTransition, OperationSource};
use crate::lock::credentials::{CredentialStore, CredentialType, Status};
use crate::sensors::{MeasurementKind, measured_value};

use super::commands::{AppCommand, PinCode};
use super::events::AppEvent;
use super::ports::{
    AttributePort, DevicePorts, EventSink, IndicatorPort, LockAttribute, SensorPort, StoragePort,
};

const LOCK_NAMESPACE: &str = "lock";
const LOCK_STATE_KEY: &str = "state";

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: DeviceConfig,
    board: Board,
    lock: LockManager,
    store: CredentialStore,
    identifying: bool,
    /// Generation of the periodic measurement timer.
    measurement_timer: Option<u32>,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch any port; call [`start`](Self::start) next.
    pub fn new(config: DeviceConfig) -> Self {
        let movement = Duration::from_millis(config.actuator_movement_ms as u64);
        Self {
            board: Board::new(&config),
            lock: LockManager::new(movement),
            store: CredentialStore::new(),
            identifying: false,
            measurement_timer: None,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore the persisted lock state, drive the indicators, publish the
    /// initial lock attribute and start periodic measurements.
    pub fn start(&mut self, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        if let Some(state) = restore_lock_state(&*hw) {
            let movement = Duration::from_millis(self.config.actuator_movement_ms as u64);
            self.lock = LockManager::with_state(state, movement);
        }
        let state = self.lock.state();

        self.board.start(hw);
        let indication = self.lock_indication();
        self.board.set_app_indication(indication, hw);
        update_lock_attribute(hw, state, OperationSource::Unspecified);

        if self.config.measurement_interval_ms > 0 {
            let period = Duration::from_millis(self.config.measurement_interval_ms as u64);
            self.measurement_timer = Some(hw.start(TimerId::Measurement, period, TimerMode::Periodic));
        }

        sink.emit(&AppEvent::Started(state));
        info!("AppService started, lock {:?}", state);
    }

    /// Block for the next queued event and handle it.
    pub fn dispatch_next<const N: usize>(
        &mut self,
        queue: &TaskQueue<Event, N>,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        queue.dispatch_next(|event| self.handle(event, hw, sink));
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// The single dispatch point.
    pub fn handle(&mut self, event: Event, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        match event {
            Event::Button(ev) => self.on_button(ev, hw, sink),
            Event::Timer(ev) => self.on_timer(ev, hw, sink),
            Event::Connectivity(ev) => self.board.on_connectivity(ev, hw, sink),
            Event::Command(cmd) => self.on_command(cmd, hw, sink),
        }
    }

    fn on_button(&mut self, ev: ButtonEvent, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        if ev.button == self.config.layout.app_button && ev.action == ButtonAction::Pressed {
            let transition = if self.lock.is_locked() {
                self.lock.unlock(OperationSource::Button, hw)
            } else {
                self.lock.lock(OperationSource::Button, hw)
            };
            if let Some(t) = transition {
                self.on_lock_transition(t, hw, sink);
            }
        }
        self.board.on_button(ev, hw, sink);
    }

    fn on_timer(&mut self, ev: TimerEvent, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        match ev.id {
            TimerId::Function => self.board.on_function_timer(ev, hw, sink),
            TimerId::Actuator => {
                if let Some(t) = self.lock.on_actuator_timer(ev) {
                    self.on_lock_transition(t, hw, sink);
                }
            }
            TimerId::Measurement => {
                if self.measurement_timer == Some(ev.generation) {
                    self.take_measurements(hw, sink);
                }
            }
        }
    }

    fn on_command(&mut self, cmd: AppCommand, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        match cmd {
            AppCommand::Lock { pin, source } => {
                if self.lock.is_locked_or_locking() {
                    info!("Lock request refused: already locked");
                    return;
                }
                if !self.pin_accepted(pin.as_ref(), sink) {
                    return;
                }
                if let Some(t) = self.lock.lock(source, hw) {
                    self.on_lock_transition(t, hw, sink);
                }
            }
            AppCommand::Unlock { pin, source } => {
                if self.lock.is_unlocked_or_unlocking() {
                    info!("Unlock request refused: already unlocked");
                    return;
                }
                if !self.pin_accepted(pin.as_ref(), sink) {
                    return;
                }
                if let Some(t) = self.lock.unlock(source, hw) {
                    self.on_lock_transition(t, hw, sink);
                }
            }
            AppCommand::IdentifyStart => {
                self.identifying = true;
                let pattern = Pattern::blink(self.config.identify_blink_ms);
                self.board.set_app_indication(pattern, hw);
            }
            AppCommand::IdentifyStop => {
                self.identifying = false;
                let indication = self.lock_indication();
                self.board.set_app_indication(indication, hw);
            }
            AppCommand::SetPinCredential { index, fabric, pin } => {
                let (status, secret) = match &pin {
                    Some(p) => (Status::Occupied, p.as_slice()),
                    None => (Status::Available, &[][..]),
                };
                let pin_type = CredentialType::Pin;
                let result = self
                    .store
                    .set_credential(index, fabric, fabric, status, pin_type, secret);
                if let Err(e) = result {
                    warn!("PIN credential {} not stored: {}", index, e);
                    sink.emit(&AppEvent::OperationRejected(e));
                }
            }
        }
    }

    fn pin_accepted(&self, pin: Option<&PinCode>, sink: &mut impl EventSink) -> bool {
        match self.store.validate_pin(pin.map(|p| p.as_slice())) {
            Ok(()) => true,
            Err(e) => {
                warn!("Lock operation rejected: {}", e);
                sink.emit(&AppEvent::OperationRejected(e));
                false
            }
        }
    }

    // ── Lock state subscriber ─────────────────────────────────

    fn on_lock_transition(
        &mut self,
        t: LockTransition,
        hw: &mut (impl IndicatorPort + AttributePort + StoragePort),
        sink: &mut impl EventSink,
    ) {
        match t.state {
            LockState::LockingInitiated => info!("Lock action initiated"),
            LockState::LockingCompleted => info!("Lock action completed"),
            LockState::UnlockingInitiated => info!("Unlock action initiated"),
            LockState::UnlockingCompleted => info!("Unlock action completed"),
        }

        if !self.identifying {
            let indication = self.lock_indication();
            self.board.set_app_indication(indication, hw);
        }
        sink.emit(&AppEvent::LockStateChanged {
            state: t.state,
            source: t.source,
        });
        update_lock_attribute(hw, t.state, t.source);

        if t.state.is_completed() {
            if let Err(e) = persist_lock_state(hw, t.state) {
                warn!("Persisting lock state failed: {}", e);
            }
        }
    }

    fn lock_indication(&self) -> Pattern {
        match self.lock.state() {
            LockState::LockingInitiated | LockState::UnlockingInitiated => {
                Pattern::blink(self.config.lock_moving_blink_ms)
            }
            completed => Pattern::solid(completed == LockState::LockingCompleted),
        }
    }

    // ── Measurements ──────────────────────────────────────────

    fn take_measurements(
        &mut self,
        hw: &mut (impl SensorPort + AttributePort),
        sink: &mut impl EventSink,
    ) {
        for kind in MeasurementKind::ALL {
            let value = measured_value(kind, hw.sample(kind));
            if let Err(e) = hw.set_measurement(value) {
                warn!("Updating {:?} measurement failed: {}", kind, e);
            }
            sink.emit(&AppEvent::Measurement(value));
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn lock(&self) -> &LockManager {
        &self.lock
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Credential management is driven by the data-model layer outside
    /// the queue, on the same task.
    pub fn store_mut(&mut self) -> &mut CredentialStore {
        &mut self.store
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}

// ───────────────────────────────────────────────────────────────
// Outbound helpers
// ───────────────────────────────────────────────────────────────

fn lock_attribute(state: LockState) -> LockAttribute {
    match state {
        LockState::LockingCompleted => LockAttribute::Locked,
        LockState::UnlockingCompleted => LockAttribute::Unlocked,
        LockState::LockingInitiated | LockState::UnlockingInitiated => {
            LockAttribute::NotFullyLocked
        }
    }
}

fn update_lock_attribute(hw: &mut impl AttributePort, state: LockState, source: OperationSource) {
    if let Err(e) = hw.set_lock_state(lock_attribute(state), source) {
        warn!("Updating lock state attribute failed: {}", e);
    }
}

fn persist_lock_state(hw: &mut impl StoragePort, state: LockState) -> Result<()> {
    let bytes = postcard::to_allocvec(&state).map_err(|_| Error::Stack(StackError::Storage))?;
    hw.write(LOCK_NAMESPACE, LOCK_STATE_KEY, &bytes)?;
    Ok(())
}

fn restore_lock_state(hw: &impl StoragePort) -> Option<LockState> {
    let mut buf = [0u8; 8];
    match hw.read(LOCK_NAMESPACE, LOCK_STATE_KEY, &mut buf) {
        Ok(n) => match postcard::from_bytes(&buf[..n]) {
            Ok(state) => Some(state),
            Err(_) => {
                warn!("Stored lock state is corrupted, starting locked");
                None
            }
        },
        Err(e) => {
            info!("No stored lock state ({}), starting locked", e);
            None
        }
    }
}
