//! Integration tests for the AppService → LockManager → ports pipeline.
//!
//! These run on the host (x86_64) and drive the service through the same
//! `handle` entry point the dispatch loop uses.

use boltlock::app::commands::{AppCommand, PinCode};
use boltlock::app::events::AppEvent;
use boltlock::app::ports::{LockAttribute, StoragePort};
use boltlock::app::service::AppService;
use boltlock::config::DeviceConfig;
use boltlock::drivers::hw_timer::{TimerId, TimerMode};
use boltlock::drivers::led_patterns::Pattern;
use boltlock::error::{SensorError, StoreError};
use boltlock::events::{ButtonAction, ButtonEvent, Event};
use boltlock::lock::bolt::{LockState, OperationSource};
use boltlock::lock::credentials::{CredentialType, Status};
use boltlock::pins::{APP_BUTTON, APP_INDICATOR};
use boltlock::sensors::{MeasuredValue, MeasurementKind};

use super::mock_hw::{MockHardware, RecordingSink};

fn make_app() -> (AppService, MockHardware, RecordingSink) {
    let mut app = AppService::new(DeviceConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    sink.take();
    (app, hw, sink)
}

fn pin(code: &[u8]) -> Option<PinCode> {
    Some(PinCode::from_slice(code).unwrap())
}

fn press_app(app: &mut AppService, hw: &mut MockHardware, sink: &mut RecordingSink) {
    let press = ButtonEvent { button: APP_BUTTON, action: ButtonAction::Pressed };
    app.handle(Event::Button(press), hw, sink);
}

fn finish_movement(app: &mut AppService, hw: &mut MockHardware, sink: &mut RecordingSink) {
    let ev = hw.expire(TimerId::Actuator).expect("actuator timer armed");
    app.handle(ev, hw, sink);
}

fn lock_events(sink: &RecordingSink) -> Vec<(LockState, OperationSource)> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::LockStateChanged { state, source } => Some((*state, *source)),
            _ => None,
        })
        .collect()
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_publishes_locked_state_and_arms_measurements() {
    let mut app = AppService::new(DeviceConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);

    assert_eq!(sink.events, vec![AppEvent::Started(LockState::LockingCompleted)]);
    assert_eq!(hw.last_lock_attribute(), Some(LockAttribute::Locked));
    assert_eq!(hw.indicator(APP_INDICATOR), Pattern::On);
    let measurement = hw.armed[&TimerId::Measurement];
    assert_eq!(measurement.mode, TimerMode::Periodic);
    assert_eq!(measurement.timeout_ms, 3000);
}

#[test]
fn zero_measurement_interval_disables_sampling() {
    let config = DeviceConfig {
        measurement_interval_ms: 0,
        ..DeviceConfig::default()
    };
    let mut app = AppService::new(config);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    assert!(!hw.is_armed(TimerId::Measurement));
}

// ── Application button ────────────────────────────────────────

#[test]
fn app_button_unlocks_then_completes_with_same_source() {
    let (mut app, mut hw, mut sink) = make_app();

    press_app(&mut app, &mut hw, &mut sink);
    assert_eq!(app.lock().state(), LockState::UnlockingInitiated);
    assert_eq!(hw.last_lock_attribute(), Some(LockAttribute::NotFullyLocked));
    assert_eq!(hw.indicator(APP_INDICATOR), Pattern::blink(50));
    assert_eq!(hw.armed[&TimerId::Actuator].timeout_ms, 2000);

    finish_movement(&mut app, &mut hw, &mut sink);
    assert_eq!(app.lock().state(), LockState::UnlockingCompleted);
    assert_eq!(hw.last_lock_attribute(), Some(LockAttribute::Unlocked));
    assert_eq!(hw.indicator(APP_INDICATOR), Pattern::Off);

    assert_eq!(
        lock_events(&sink),
        vec![
            (LockState::UnlockingInitiated, OperationSource::Button),
            (LockState::UnlockingCompleted, OperationSource::Button),
        ]
    );
}

#[test]
fn app_button_while_unlocked_locks() {
    let (mut app, mut hw, mut sink) = make_app();
    press_app(&mut app, &mut hw, &mut sink);
    finish_movement(&mut app, &mut hw, &mut sink);
    press_app(&mut app, &mut hw, &mut sink);
    finish_movement(&mut app, &mut hw, &mut sink);
    assert!(app.lock().is_locked());
    assert_eq!(hw.indicator(APP_INDICATOR), Pattern::On);
}

#[test]
fn stale_actuator_expiry_after_reversal_is_ignored() {
    let (mut app, mut hw, mut sink) = make_app();
    press_app(&mut app, &mut hw, &mut sink);
    let stale = hw.expire(TimerId::Actuator).unwrap();

    // Reverse half-way: the bolt is not unlocked yet, so the button locks.
    press_app(&mut app, &mut hw, &mut sink);
    assert_eq!(app.lock().state(), LockState::LockingInitiated);

    app.handle(stale, &mut hw, &mut sink);
    assert_eq!(app.lock().state(), LockState::LockingInitiated);

    finish_movement(&mut app, &mut hw, &mut sink);
    assert_eq!(app.lock().state(), LockState::LockingCompleted);
}

// ── Remote commands ───────────────────────────────────────────

#[test]
fn remote_lock_when_locked_is_refused_without_side_effects() {
    let (mut app, mut hw, mut sink) = make_app();
    let starts = hw.timer_starts.len();
    app.handle(
        Event::Command(AppCommand::Lock { pin: None, source: OperationSource::Remote }),
        &mut hw,
        &mut sink,
    );
    assert_eq!(hw.timer_starts.len(), starts);
    assert!(sink.events.is_empty());
}

#[test]
fn remote_unlock_without_pin_is_accepted() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle(
        Event::Command(AppCommand::Unlock { pin: None, source: OperationSource::Remote }),
        &mut hw,
        &mut sink,
    );
    finish_movement(&mut app, &mut hw, &mut sink);
    assert_eq!(
        hw.lock_attributes.last(),
        Some(&(LockAttribute::Unlocked, OperationSource::Remote))
    );
}

#[test]
fn remote_unlock_checks_pin() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle(
        Event::Command(AppCommand::SetPinCredential { index: 3, fabric: 1, pin: pin(b"2468") }),
        &mut hw,
        &mut sink,
    );
    assert_eq!(
        app.store().get_credential(3, CredentialType::Pin).unwrap().status,
        Status::Occupied
    );

    app.handle(
        Event::Command(AppCommand::Unlock { pin: pin(b"2469"), source: OperationSource::Remote }),
        &mut hw,
        &mut sink,
    );
    assert_eq!(
        sink.take(),
        vec![AppEvent::OperationRejected(StoreError::InvalidCredential)]
    );
    assert!(app.lock().is_locked());

    app.handle(
        Event::Command(AppCommand::Unlock { pin: pin(b"2468"), source: OperationSource::Remote }),
        &mut hw,
        &mut sink,
    );
    assert_eq!(app.lock().state(), LockState::UnlockingInitiated);
}

#[test]
fn cleared_pin_no_longer_validates() {
    let (mut app, mut hw, mut sink) = make_app();
    let set = |pin| Event::Command(AppCommand::SetPinCredential { index: 1, fabric: 2, pin });
    app.handle(set(pin(b"1111")), &mut hw, &mut sink);
    app.handle(set(None), &mut hw, &mut sink);
    assert_eq!(
        app.store().validate_pin(Some(&b"1111"[..])),
        Err(StoreError::InvalidCredential)
    );
}

#[test]
fn pin_in_slot_zero_is_rejected() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle(
        Event::Command(AppCommand::SetPinCredential { index: 0, fabric: 1, pin: pin(b"1") }),
        &mut hw,
        &mut sink,
    );
    assert_eq!(
        sink.events,
        vec![AppEvent::OperationRejected(StoreError::IndexOutOfRange)]
    );
}

// ── Identify ──────────────────────────────────────────────────

#[test]
fn identify_overrides_lock_indication_until_stopped() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle(Event::Command(AppCommand::IdentifyStart), &mut hw, &mut sink);
    assert_eq!(hw.indicator(APP_INDICATOR), Pattern::blink(500));

    // Lock movement does not disturb identify.
    press_app(&mut app, &mut hw, &mut sink);
    finish_movement(&mut app, &mut hw, &mut sink);
    assert_eq!(hw.indicator(APP_INDICATOR), Pattern::blink(500));

    app.handle(Event::Command(AppCommand::IdentifyStop), &mut hw, &mut sink);
    assert_eq!(hw.indicator(APP_INDICATOR), Pattern::Off);
}

// ── Attributes and persistence ────────────────────────────────

#[test]
fn attribute_failure_does_not_stop_the_transition() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.fail_attributes = true;
    press_app(&mut app, &mut hw, &mut sink);
    finish_movement(&mut app, &mut hw, &mut sink);
    assert_eq!(app.lock().state(), LockState::UnlockingCompleted);
    assert_eq!(lock_events(&sink).len(), 2);
}

#[test]
fn completed_state_survives_restart() {
    let (mut app, mut hw, mut sink) = make_app();
    press_app(&mut app, &mut hw, &mut sink);
    assert!(!hw.exists("lock", "state"));
    finish_movement(&mut app, &mut hw, &mut sink);
    assert!(hw.exists("lock", "state"));

    let mut restarted = AppService::new(DeviceConfig::default());
    restarted.start(&mut hw, &mut sink);
    assert_eq!(restarted.lock().state(), LockState::UnlockingCompleted);
    assert_eq!(hw.last_lock_attribute(), Some(LockAttribute::Unlocked));
}

#[test]
fn corrupted_lock_blob_starts_locked() {
    let mut hw = MockHardware::new();
    hw.write("lock", "state", &[0xff, 0xff]).unwrap();
    let mut app = AppService::new(DeviceConfig::default());
    app.start(&mut hw, &mut RecordingSink::new());
    assert!(app.lock().is_locked());
}

// ── Measurements ──────────────────────────────────────────────

#[test]
fn measurement_tick_reports_every_kind() {
    let (mut app, mut hw, mut sink) = make_app();
    let tick = hw.expire(TimerId::Measurement).unwrap();
    app.handle(tick, &mut hw, &mut sink);
    assert_eq!(
        hw.measurements,
        vec![
            MeasuredValue::Temperature(2150),
            MeasuredValue::Humidity(4000),
            MeasuredValue::Pressure(1013),
        ]
    );
    // Periodic timers stay armed.
    assert!(hw.is_armed(TimerId::Measurement));
}

#[test]
fn failed_and_out_of_range_reads_become_sentinels() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.readings
        .insert(MeasurementKind::Temperature, Err(SensorError::ReadFailed));
    hw.readings.insert(MeasurementKind::Humidity, Ok(140.0));
    let tick = hw.expire(TimerId::Measurement).unwrap();
    app.handle(tick, &mut hw, &mut sink);
    assert_eq!(hw.measurements[0], MeasuredValue::Temperature(i16::MIN));
    assert_eq!(hw.measurements[1], MeasuredValue::Humidity(0xffff));
    assert_eq!(hw.measurements[2], MeasuredValue::Pressure(1013));
    assert!(sink.events.contains(&AppEvent::Measurement(MeasuredValue::Humidity(0xffff))));
}
