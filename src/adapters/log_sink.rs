//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing driver events to the ESP-IDF logger
//! (UART / USB-CDC in production, stderr on the host).

use log::{info, warn};

use crate::app::events::DriverEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DriverEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DriverEvent) {
        match event {
            DriverEvent::DeviceDiscovered(address) => {
                info!("TRV | discovered {}", address);
            }
            DriverEvent::CommandIssued { target, command } => {
                info!("CMD | {} -> {}", command, target);
            }
            DriverEvent::CommandCompleted(s) | DriverEvent::StatusUpdated(s) => {
                info!(
                    "STATUS | {} | T={:.1}\u{00b0}C valve={}% | {} | lock={} holiday={} boost={} \
                     window={} dst={} battery={}",
                    s.address,
                    s.temperature,
                    s.valve,
                    if s.auto_mode { "auto" } else { "manual" },
                    s.locked,
                    s.holiday,
                    s.boost,
                    s.window_open,
                    s.dst,
                    if s.low_battery { "LOW" } else { "OK" },
                );
            }
            DriverEvent::CommandFailed { target, error } => {
                warn!("CMD | {} failed: {}", target, error);
            }
        }
    }
}
