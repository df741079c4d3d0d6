//! EQ-3 thermostat wire protocol.
//!
//! Commands are written to a single GATT characteristic as a short byte
//! frame: one opcode byte followed by up to six payload bytes.  The device
//! answers on a second, notify-only characteristic; the only answer this
//! driver understands is the status report (`02 01 …`).
//!
//! ```text
//!  caller ──▶ TrvCommand::encode ──▶ [op, p0 .. p5] ──▶ command char
//!                                                          │
//!  TrvStatus ◀── decode_status ◀── [02, 01, flags, valve, _, temp] ◀── notify char
//! ```
//!
//! Temperatures travel in half-degree units: `byte = (celsius * 2) as u8`.
//! The cast truncates, so callers must round to 0.5 °C first.

pub mod command;
pub mod status;

pub use command::{CommandFrame, DeviceTime, HolidayEnd, TrvCommand};
pub use status::{StatusFlag, StatusReport, decode_status};

/// Primary service advertised by every EQ-3 thermostat.
pub const SERVICE_UUID: u128 = 0x3e135142_654f_9090_134a_a6ff5bb77046;
/// Write characteristic carrying command frames.
pub const COMMAND_CHAR_UUID: u128 = 0x3fa4585a_ce4a_3bad_db4b_b8df8179ea09;
/// Notify characteristic carrying status reports.
pub const NOTIFY_CHAR_UUID: u128 = 0xd0e8434d_cd29_0996_af41_6c90f4e0eb2a;

/// Convert degrees Celsius to the device's half-degree byte.
///
/// Truncates toward zero; values outside `0.0..=127.5` saturate.
pub fn celsius_to_byte(celsius: f32) -> u8 {
    (celsius * 2.0) as u8
}

/// Convert a half-degree byte back to degrees Celsius.
pub fn byte_to_celsius(byte: u8) -> f32 {
    f32::from(byte) / 2.0
}
