//! Status report decoding.
//!
//! ```text
//!  byte  0     1     2       3       4    5
//!       ┌────┬────┬───────┬───────┬────┬──────┐
//!       │ 02 │ 01 │ flags │ valve │ -- │ temp │
//!       └────┴────┴───────┴───────┴────┴──────┘
//! ```
//!
//! Longer reports carry holiday and window settings after byte 5; they are
//! not interpreted here.

use super::byte_to_celsius;

/// First two bytes of every status report.
pub const STATUS_PREFIX: [u8; 2] = [0x02, 0x01];

const MIN_STATUS_LEN: usize = 6;
const FLAGS_INDEX: usize = 2;
const VALVE_INDEX: usize = 3;
const TEMPERATURE_INDEX: usize = 5;

/// Bits of the status flag byte.  Bit 6 carries nothing this driver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusFlag {
    /// Set in manual mode, clear in automatic mode.
    Manual = 0b0000_0001,
    Holiday = 0b0000_0010,
    Boost = 0b0000_0100,
    DaylightSaving = 0b0000_1000,
    WindowOpen = 0b0001_0000,
    Locked = 0b0010_0000,
    LowBattery = 0b1000_0000,
}

impl StatusFlag {
    /// Return the bitmask for this flag.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

/// A decoded status report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    /// Valve opening in percent.
    pub valve: u8,
    /// Target temperature in °C.
    pub temperature: f32,
    /// Raw flag byte, see [`StatusFlag`].
    pub flags: u8,
}

impl StatusReport {
    pub fn has(&self, flag: StatusFlag) -> bool {
        self.flags & flag.mask() != 0
    }

    pub fn auto_mode(&self) -> bool {
        !self.has(StatusFlag::Manual)
    }
}

/// Decode a notification payload.
///
/// Returns `None` for anything that is not a status report: other message
/// types are protocol noise, not errors.
pub fn decode_status(payload: &[u8]) -> Option<StatusReport> {
    if payload.len() < MIN_STATUS_LEN || payload[..2] != STATUS_PREFIX {
        return None;
    }
    Some(StatusReport {
        valve: payload[VALVE_INDEX],
        temperature: byte_to_celsius(payload[TEMPERATURE_INDEX]),
        flags: payload[FLAGS_INDEX],
    })
}
