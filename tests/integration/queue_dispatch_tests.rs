//! Producer → TaskQueue → AppService dispatch, with producers on other
//! threads the way interrupt handlers run on the device.

use boltlock::app::service::AppService;
use boltlock::config::{BoardLayout, DeviceConfig};
use boltlock::drivers::button::ButtonWatch;
use boltlock::drivers::hw_timer::TimerId;
use boltlock::error::QueueError;
use boltlock::events::{ConnectivityEvent, Event, TASK_QUEUE_DEPTH, TaskQueue};
use boltlock::lock::bolt::LockState;
use boltlock::pins::{APP_BUTTON, button_mask};

use super::mock_hw::{MockHardware, RecordingSink};

fn leaked_queue() -> &'static TaskQueue<Event> {
    Box::leak(Box::new(TaskQueue::new()))
}

#[test]
fn button_edges_from_another_thread_drive_the_lock() {
    let queue = leaked_queue();
    let watch = ButtonWatch::from_layout(&BoardLayout::default());
    let tx = queue.sender();

    let producer = std::thread::spawn(move || {
        let mask = button_mask(APP_BUTTON);
        let pressed = watch.on_change(mask, mask, &tx);
        let released = watch.on_change(0, mask, &tx);
        pressed + released
    });
    assert_eq!(producer.join().unwrap(), 2);

    let mut app = AppService::new(DeviceConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);

    app.dispatch_next(queue, &mut hw, &mut sink);
    assert_eq!(app.lock().state(), LockState::UnlockingInitiated);
    app.dispatch_next(queue, &mut hw, &mut sink);
    assert!(queue.is_empty());

    queue.post(hw.expire(TimerId::Actuator).unwrap()).unwrap();
    app.dispatch_next(queue, &mut hw, &mut sink);
    assert_eq!(app.lock().state(), LockState::UnlockingCompleted);
}

#[test]
fn unwatched_buttons_are_not_posted() {
    let queue = leaked_queue();
    let watch = ButtonWatch::from_layout(&BoardLayout::default());
    let mask = button_mask(7);
    assert_eq!(watch.on_change(mask, mask, &queue.sender()), 0);
    assert!(queue.is_empty());
}

#[test]
fn overflow_drops_newest_and_keeps_order() {
    let queue = leaked_queue();
    for connections in 0..TASK_QUEUE_DEPTH as u16 {
        queue
            .post(Event::Connectivity(ConnectivityEvent::BleAdvertisingChange {
                advertising: true,
                connections,
            }))
            .unwrap();
    }
    let extra = Event::Connectivity(ConnectivityEvent::NetworkChange {
        provisioned: true,
        enabled: true,
    });
    assert_eq!(queue.post(extra), Err(QueueError::Full));
    assert_eq!(queue.len(), TASK_QUEUE_DEPTH);

    for expected in 0..TASK_QUEUE_DEPTH as u16 {
        let got = queue.dispatch_next(|e| e);
        assert_eq!(
            got,
            Event::Connectivity(ConnectivityEvent::BleAdvertisingChange {
                advertising: true,
                connections: expected,
            })
        );
    }
    assert!(queue.is_empty());
}

#[test]
fn consumer_blocks_until_a_producer_posts() {
    let queue = leaked_queue();
    let tx = queue.sender();
    let producer = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        tx.post(Event::Connectivity(ConnectivityEvent::NetworkChange {
            provisioned: true,
            enabled: true,
        }))
    });

    let mut app = AppService::new(DeviceConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    app.dispatch_next(queue, &mut hw, &mut sink);

    assert!(producer.join().unwrap().is_ok());
    assert_eq!(
        app.board().device_state(),
        boltlock::board::DeviceState::Provisioned
    );
}
