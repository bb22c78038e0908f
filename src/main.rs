//! BoltLock host simulator: main entry point.
//!
//! Runs the complete controller against simulated hardware.  Button edges,
//! connectivity reports and remote commands are typed on stdin and posted
//! into the task queue exactly as interrupt handlers would post them.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimDevice (timers, LEDs, stack, sensors, storage)             │
//! │  LogEventSink (EventSink)      NvsAdapter (Config+Storage)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (single consumer)              │    │
//! │  │  Board · LockManager · CredentialStore                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  stdin console ──▶ TaskQueue ◀── HostTimers                    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `boltlock-sim [config.json]`, log level via `RUST_LOG`.
#![deny(unused_must_use)]

use std::io::BufRead;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use boltlock::adapters::log_sink::LogEventSink;
use boltlock::adapters::nvs::NvsAdapter;
use boltlock::adapters::sim::{SimControls, SimDevice};
use boltlock::app::commands::{AppCommand, PinCode};
use boltlock::app::ports::ConfigPort;
use boltlock::app::service::AppService;
use boltlock::config::{DeviceConfig, MAX_CREDENTIAL_LEN};
use boltlock::drivers::button::ButtonWatch;
use boltlock::events::{ConnectivityEvent, Event, TaskQueue, TaskSender};
use boltlock::lock::bolt::OperationSource;
use boltlock::pins::button_mask;

/// Indicator refresh period of the dispatch loop.
const TICK: Duration = Duration::from_millis(10);

// ── Console ───────────────────────────────────────────────────

const HELP: &str = "\
commands:
  press <n> | release <n>     button edge on bit n
  net up | net down           operational network report
  ble adv | ble conn | ble idle
  lock [pin] | unlock [pin]   remote lock operation
  identify on | identify off
  pin <slot> [pin]            set or clear a PIN credential
  sensor fail | sensor ok
  quit";

enum Console {
    Post(Event),
    Buttons { state: u32, changed: u32 },
    Quit,
}

fn pin_code(arg: Option<&str>) -> Result<Option<PinCode>> {
    match arg {
        None => Ok(None),
        Some(s) => match PinCode::from_slice(s.as_bytes()) {
            Ok(pin) => Ok(Some(pin)),
            Err(()) => bail!("PIN longer than {} bytes", MAX_CREDENTIAL_LEN),
        },
    }
}

fn parse(line: &str, buttons: &mut u32, controls: &SimControls) -> Result<Option<Console>> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let console = match (cmd, arg) {
        ("press" | "release", Some(n)) => {
            let bit: u8 = n.parse().context("button bit")?;
            if bit >= 32 {
                bail!("button bit out of range");
            }
            let mask = button_mask(bit);
            let before = *buttons;
            if cmd == "press" {
                *buttons |= mask;
            } else {
                *buttons &= !mask;
            }
            Console::Buttons {
                state: *buttons,
                changed: before ^ *buttons,
            }
        }
        ("net", Some(dir @ ("up" | "down"))) => {
            let enabled = dir == "up";
            if enabled {
                controls.join_fabric();
            }
            Console::Post(Event::Connectivity(ConnectivityEvent::NetworkChange {
                provisioned: true,
                enabled,
            }))
        }
        ("ble", Some(what @ ("adv" | "conn" | "idle"))) => {
            controls.set_advertising(what != "idle");
            Console::Post(Event::Connectivity(
                ConnectivityEvent::BleAdvertisingChange {
                    advertising: what != "idle",
                    connections: u16::from(what == "conn"),
                },
            ))
        }
        ("lock", _) => Console::Post(Event::Command(AppCommand::Lock {
            pin: pin_code(arg)?,
            source: OperationSource::Remote,
        })),
        ("unlock", _) => Console::Post(Event::Command(AppCommand::Unlock {
            pin: pin_code(arg)?,
            source: OperationSource::Remote,
        })),
        ("identify", Some("on")) => Console::Post(Event::Command(AppCommand::IdentifyStart)),
        ("identify", Some("off")) => Console::Post(Event::Command(AppCommand::IdentifyStop)),
        ("pin", Some(slot)) => Console::Post(Event::Command(AppCommand::SetPinCredential {
            index: slot.parse().context("PIN slot")?,
            fabric: 1,
            pin: pin_code(words.next())?,
        })),
        ("sensor", Some(state @ ("fail" | "ok"))) => {
            controls.set_sensor_fault(state == "fail");
            return Ok(None);
        }
        ("help", _) => {
            info!("{}", HELP);
            return Ok(None);
        }
        ("quit" | "exit", _) => Console::Quit,
        _ => bail!("unknown command '{}'\n{}", line.trim(), HELP),
    };
    Ok(Some(console))
}

/// Read stdin and post into the queue the way interrupt handlers would.
fn spawn_console(
    tx: TaskSender<'static, Event>,
    watch: ButtonWatch,
    controls: SimControls,
) -> Result<std::sync::mpsc::Receiver<()>> {
    let (quit_tx, quit_rx) = std::sync::mpsc::channel();
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            let mut buttons = 0u32;
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse(&line, &mut buttons, &controls) {
                    Ok(Some(Console::Post(event))) => {
                        // A full queue is logged by the queue itself.
                        let _ = tx.post(event);
                    }
                    Ok(Some(Console::Buttons { state, changed })) => {
                        watch.on_change(state, changed, &tx);
                    }
                    Ok(Some(Console::Quit)) => break,
                    Ok(None) => {}
                    Err(e) => warn!("{:#}", e),
                }
            }
            let _ = quit_tx.send(());
        })
        .context("spawning console thread")?;
    Ok(quit_rx)
}

// ── Configuration ─────────────────────────────────────────────

fn load_config(nvs: &NvsAdapter) -> Result<DeviceConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path))?;
            // serde_json is built without `std`, so its error is not a std error.
            let config: DeviceConfig = serde_json::from_str(&text)
                .map_err(|e| anyhow::anyhow!("parsing {}: {}", path, e))?;
            info!("Config loaded from {}", path);
            config
        }
        None => nvs
            .load()
            .map_err(|e| anyhow::anyhow!("loading stored config: {}", e))?,
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════╗");
    info!("║  BoltLock simulator v{}           ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let nvs = NvsAdapter::new();
    let config = load_config(&nvs)?;
    nvs.save(&config)
        .map_err(|e| anyhow::anyhow!("persisting config: {}", e))?;

    // Producers need a queue that outlives them.
    let queue: &'static TaskQueue<Event> = Box::leak(Box::new(TaskQueue::new()));

    let mut dev = SimDevice::new(queue.sender(), nvs, config.layout.indicator_count);
    let mut sink = LogEventSink::new();
    let watch = ButtonWatch::from_layout(&config.layout);
    let quit = spawn_console(queue.sender(), watch, dev.controls())?;

    let mut app = AppService::new(config.clone());
    app.start(&mut dev, &mut sink);
    info!("System ready. Type 'help' for commands.");

    let mut last = Instant::now();
    // Polled rather than blocking so the LED patterns keep ticking.
    loop {
        while queue.try_dispatch_next(|event| app.handle(event, &mut dev, &mut sink)) {
            if dev.take_factory_reset() {
                dev.factory_reset();
                app = AppService::new(config.clone());
                app.start(&mut dev, &mut sink);
            }
        }

        if quit.try_recv().is_ok() {
            info!("Console closed, shutting down");
            return Ok(());
        }

        std::thread::sleep(TICK);
        let now = Instant::now();
        dev.tick(now.duration_since(last).as_millis() as u32);
        last = now;
    }
}
