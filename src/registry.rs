//! Device registry: every thermostat seen since boot.
//!
//! Records are created invalid when a device is discovered and are never
//! removed.  Lookups are linear; a household has a handful of radiators.

use crate::address::DeviceAddress;
use crate::codec::{StatusFlag, StatusReport};

/// Last known state of one thermostat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrvStatus {
    pub address: DeviceAddress,
    /// `true` once a status report arrived; cleared by a failed command.
    pub valid: bool,
    /// Target temperature in °C (half-degree resolution).
    pub temperature: f32,
    /// Temperature offset in °C.  Status reports do not carry it.
    pub offset_temperature: f32,
    /// Valve opening in percent.
    pub valve: u8,
    pub auto_mode: bool,
    pub locked: bool,
    pub holiday: bool,
    pub dst: bool,
    pub boost: bool,
    pub window_open: bool,
    pub low_battery: bool,
}

impl TrvStatus {
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            valid: false,
            temperature: 0.0,
            offset_temperature: 0.0,
            valve: 0,
            auto_mode: false,
            locked: false,
            holiday: false,
            dst: false,
            boost: false,
            window_open: false,
            low_battery: false,
        }
    }

    /// Overwrite the decoded fields and mark the record valid.
    pub fn apply(&mut self, report: &StatusReport) {
        self.valid = true;
        self.valve = report.valve;
        self.temperature = report.temperature;
        self.auto_mode = report.auto_mode();
        self.holiday = report.has(StatusFlag::Holiday);
        self.boost = report.has(StatusFlag::Boost);
        self.dst = report.has(StatusFlag::DaylightSaving);
        self.window_open = report.has(StatusFlag::WindowOpen);
        self.locked = report.has(StatusFlag::Locked);
        self.low_battery = report.has(StatusFlag::LowBattery);
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// Insert-only table of [`TrvStatus`] records, in discovery order.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    records: Vec<TrvStatus>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an invalid record for `address` unless one exists.
    /// Returns `true` if the device is new.
    pub fn register_if_new(&mut self, address: DeviceAddress) -> bool {
        if self.find(&address).is_some() {
            return false;
        }
        self.records.push(TrvStatus::new(address));
        true
    }

    pub fn find(&self, address: &DeviceAddress) -> Option<&TrvStatus> {
        self.records.iter().find(|r| r.address == *address)
    }

    pub fn find_mut(&mut self, address: &DeviceAddress) -> Option<&mut TrvStatus> {
        self.records.iter_mut().find(|r| r.address == *address)
    }

    /// Every address discovered since boot, in discovery order.
    pub fn addresses(&self) -> impl Iterator<Item = &DeviceAddress> + '_ {
        self.records.iter().map(|r| &r.address)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
