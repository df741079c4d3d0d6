//! Scan cooldown timer.
//!
//! Scanning and an open GATT connection compete for the same radio, so an
//! external scanner only starts a new scan once this timer has expired.
//! The driver re-arms it each time it tears a connection down.

/// Single-deadline cooldown timer on the driver's millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTimer {
    interval_ms: u32,
    next_scan_ms: u64,
}

impl ScanTimer {
    /// A new timer starts expired, so the first scan may run immediately.
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            next_scan_ms: 0,
        }
    }

    /// Push the next allowed scan to `now + interval`.
    pub fn trigger(&mut self, now_ms: u64) {
        self.next_scan_ms = now_ms + self.interval_ms as u64;
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.next_scan_ms
    }
}
