//! Command encoding.
//!
//! | Operation              | Opcode | Payload                                          |
//! |------------------------|--------|--------------------------------------------------|
//! | Select temperature     | `0x41` | temp×2                                           |
//! | Comfort + reduced temps| `0x11` | comfort×2, reduced×2                             |
//! | Select comfort         | `0x43` | —                                                |
//! | Select reduced         | `0x44` | —                                                |
//! | Set clock              | `0x03` | year%100, month, day, hour, minute, second       |
//! | Boost                  | `0x45` | 0/1                                              |
//! | Holiday                | `0x40` | temp×2 \| 0x80, day, year%100, hour×2+min/30, month |
//! | Lock                   | `0x80` | 0/1                                              |
//! | Offset                 | `0x13` | offset×2 + 7                                     |
//! | Open-window params     | `0x14` | temp×2, minutes/5                                |
//! | Auto / manual mode     | `0x40` | 0x00 / 0x40                                      |
//!
//! `On` and `Off` have no opcode of their own; the device treats 30.0 °C
//! and 4.5 °C as "fully open" and "closed".

use super::celsius_to_byte;

/// Longest frame the device accepts (set-clock: opcode + 6 bytes).
pub const MAX_FRAME_LEN: usize = 7;

/// Temperature sent for [`TrvCommand::On`].
pub const ON_TEMPERATURE: f32 = 30.0;
/// Temperature sent for [`TrvCommand::Off`].
pub const OFF_TEMPERATURE: f32 = 4.5;

pub mod opcode {
    pub const SET_CLOCK: u8 = 0x03;
    pub const SET_TEMPERATURES: u8 = 0x11;
    pub const SET_OFFSET: u8 = 0x13;
    pub const SET_WINDOW_OPEN: u8 = 0x14;
    pub const SET_MODE: u8 = 0x40;
    pub const SELECT_TEMPERATURE: u8 = 0x41;
    pub const SELECT_COMFORT: u8 = 0x43;
    pub const SELECT_REDUCED: u8 = 0x44;
    pub const BOOST: u8 = 0x45;
    pub const LOCK: u8 = 0x80;
}

const MODE_MANUAL: u8 = 0x40;
const HOLIDAY_FLAG: u8 = 0x80;
const OFFSET_BIAS: f32 = 7.0;

// ───────────────────────────────────────────────────────────────
// Parameter types
// ───────────────────────────────────────────────────────────────

/// Wall-clock time pushed to the thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// End of a holiday period.  The device resolves minutes to half hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolidayEnd {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

// ───────────────────────────────────────────────────────────────
// Commands
// ───────────────────────────────────────────────────────────────

/// A high-level thermostat operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrvCommand {
    SelectTemperature(f32),
    SetTemperatures { comfort: f32, reduced: f32 },
    SelectComfort,
    SelectReduced,
    SetClock(DeviceTime),
    Boost(bool),
    Holiday { temperature: f32, until: HolidayEnd },
    Lock(bool),
    Offset(f32),
    WindowOpen { temperature: f32, minutes: u16 },
    Mode { automatic: bool },
    On,
    Off,
}

impl TrvCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectTemperature(_) => "select-temperature",
            Self::SetTemperatures { .. } => "set-temperatures",
            Self::SelectComfort => "select-comfort",
            Self::SelectReduced => "select-reduced",
            Self::SetClock(_) => "set-clock",
            Self::Boost(_) => "boost",
            Self::Holiday { .. } => "holiday",
            Self::Lock(_) => "lock",
            Self::Offset(_) => "offset",
            Self::WindowOpen { .. } => "window-open",
            Self::Mode { .. } => "mode",
            Self::On => "on",
            Self::Off => "off",
        }
    }

    /// Encode into the bytes written to the command characteristic.
    pub fn encode(&self) -> CommandFrame {
        match *self {
            Self::SelectTemperature(t) => {
                CommandFrame::new(opcode::SELECT_TEMPERATURE, &[celsius_to_byte(t)])
            }
            Self::SetTemperatures { comfort, reduced } => CommandFrame::new(
                opcode::SET_TEMPERATURES,
                &[celsius_to_byte(comfort), celsius_to_byte(reduced)],
            ),
            Self::SelectComfort => CommandFrame::new(opcode::SELECT_COMFORT, &[]),
            Self::SelectReduced => CommandFrame::new(opcode::SELECT_REDUCED, &[]),
            Self::SetClock(t) => CommandFrame::new(
                opcode::SET_CLOCK,
                &[
                    (t.year % 100) as u8,
                    t.month,
                    t.day,
                    t.hour,
                    t.minute,
                    t.second,
                ],
            ),
            Self::Boost(on) => CommandFrame::new(opcode::BOOST, &[u8::from(on)]),
            Self::Holiday { temperature, until } => CommandFrame::new(
                opcode::SET_MODE,
                &[
                    celsius_to_byte(temperature) | HOLIDAY_FLAG,
                    until.day,
                    (until.year % 100) as u8,
                    until.hour.wrapping_mul(2).wrapping_add(until.minute / 30),
                    until.month,
                ],
            ),
            Self::Lock(on) => CommandFrame::new(opcode::LOCK, &[u8::from(on)]),
            Self::Offset(offset) => {
                CommandFrame::new(opcode::SET_OFFSET, &[(offset * 2.0 + OFFSET_BIAS) as u8])
            }
            Self::WindowOpen {
                temperature,
                minutes,
            } => CommandFrame::new(
                opcode::SET_WINDOW_OPEN,
                &[celsius_to_byte(temperature), (minutes / 5) as u8],
            ),
            Self::Mode { automatic } => CommandFrame::new(
                opcode::SET_MODE,
                &[if automatic { 0x00 } else { MODE_MANUAL }],
            ),
            Self::On => Self::SelectTemperature(ON_TEMPERATURE).encode(),
            Self::Off => Self::SelectTemperature(OFF_TEMPERATURE).encode(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Frame
// ───────────────────────────────────────────────────────────────

/// An encoded command: opcode followed by its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl CommandFrame {
    fn new(opcode: u8, payload: &[u8]) -> Self {
        debug_assert!(payload.len() < MAX_FRAME_LEN);
        let len = (payload.len() + 1).min(MAX_FRAME_LEN);
        let mut bytes = [0u8; MAX_FRAME_LEN];
        bytes[0] = opcode;
        bytes[1..len].copy_from_slice(&payload[..len - 1]);
        Self { bytes, len }
    }

    pub fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..self.len]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
