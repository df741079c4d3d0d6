//! EQ-3 thermostat gateway firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                   │
//! │                                                            │
//! │  NimbleTransport   Esp32TimeAdapter   LogEventSink         │
//! │  (TransportPort)   (ClockPort)        (EventSink)          │
//! │                                                            │
//! │  ───────────────── Port Trait Boundary ────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │                TrvDriver (pure logic)                │  │
//! │  │  FSM · Registry · Session · ScanTimer                │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop scans whenever the radio is free and the scan cooldown has
//! passed, then walks the known thermostats one at a time, pushing the
//! local time to each with an asynchronous clock command.  Every reply
//! is logged by the event sink.
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{info, warn};

use eq3_trv::adapters::log_sink::LogEventSink;
use eq3_trv::adapters::nimble::{self, NimbleTransport};
use eq3_trv::adapters::time::Esp32TimeAdapter;
use eq3_trv::app::commands::CommandMode;
use eq3_trv::app::ports::ClockPort;
use eq3_trv::app::service::{CompletionStatus, TrvDriver};
use eq3_trv::config::DriverConfig;
use eq3_trv::events::EventInbox;

/// Main loop period.
const LOOP_PERIOD_MS: u32 = 50;
/// Length of one active scan window.
const SCAN_DURATION_MS: i32 = 10_000;
/// Gap between two thermostat refreshes.
const REFRESH_PERIOD_MS: u64 = 30_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  eq3-trv gateway v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Driver + adapters ──────────────────────────────────
    let config = DriverConfig::default();
    let inbox = Arc::new(EventInbox::new());
    let transport = NimbleTransport::new(Arc::clone(&inbox));
    let mut driver = TrvDriver::with_inbox(
        config,
        Arc::clone(&inbox),
        transport,
        Esp32TimeAdapter::new(),
        LogEventSink::new(),
    )?;
    let wall_clock = Esp32TimeAdapter::new();

    let mut next_refresh_ms = 0u64;
    let mut cursor = 0usize;

    // ── 3. Main loop ──────────────────────────────────────────
    loop {
        if driver.is_idle() && driver.is_scan_interval_expired() {
            if let Err(e) = nimble::scan(&inbox, SCAN_DURATION_MS) {
                warn!("Scan aborted: {}", e);
            }
            driver.trigger_scan_interval();
            driver.process_events();
        }

        let now = wall_clock.now_ms();
        if driver.is_idle() && now >= next_refresh_ms {
            next_refresh_ms = now + REFRESH_PERIOD_MS;
            let known = driver.known_addresses().count();
            let target = driver.known_addresses().nth(cursor % known.max(1)).copied();
            cursor = cursor.wrapping_add(1);

            match (target, wall_clock.local_time()) {
                (Some(target), Some(time)) => {
                    if let Err(e) = driver.set_clock(target, time, CommandMode::Async) {
                        warn!("Clock sync for {} not started: {}", target, e);
                    }
                }
                (Some(target), None) => {
                    info!("Wall clock not synced, skipping refresh of {}", target);
                }
                (None, _) => {}
            }
        }

        match driver.poll_completion() {
            CompletionStatus::Success => {
                if let Some(status) = driver.take_last_result() {
                    info!(
                        "{} refreshed ({:.1}\u{00b0}C, valve {}%)",
                        status.address, status.temperature, status.valve
                    );
                }
            }
            CompletionStatus::Error(e) => {
                warn!("Refresh failed: {}", e);
            }
            CompletionStatus::NoResult => {}
        }

        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
