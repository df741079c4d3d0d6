//! Unified error types for the thermostat driver.
//!
//! A single `Error` enum that every subsystem can convert into, plus the
//! narrower [`CommandError`] that command methods return to callers.
//! All variants are `Copy` so they can be stored in the state-machine
//! context and handed back from `poll_completion` without allocation.

use core::fmt;

use crate::app::ports::TransportError;

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A thermostat command did not complete.
    Command(CommandError),
    /// The BLE transport reported a failure outside of a command.
    Transport(TransportError),
    /// A device address string could not be parsed.
    Address(AddressParseError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Address(e) => write!(f, "address: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Why a command was rejected or did not produce a status report.
///
/// Everything except [`Busy`](Self::Busy) leaves the target's status record
/// marked invalid; the state machine is always back in `Idle` afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Another command is still in flight.  Nothing was changed.
    Busy,
    /// The BLE connection could not be established.
    ConnectFailed,
    /// The thermostat service or one of its characteristics is missing.
    ServiceNotFound,
    /// The notify characteristic refused the subscription.
    SubscribeFailed,
    /// The command characteristic refused the write.
    WriteFailed,
    /// No status notification arrived before the deadline.
    Timeout,
}

impl CommandError {
    /// Whether the failure invalidates the target's status record.
    pub const fn invalidates_status(self) -> bool {
        !matches!(self, Self::Busy)
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "command already running"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::ServiceNotFound => write!(f, "thermostat service not found"),
            Self::SubscribeFailed => write!(f, "notify subscription failed"),
            Self::WriteFailed => write!(f, "command write failed"),
            Self::Timeout => write!(f, "no status notification before timeout"),
        }
    }
}

impl core::error::Error for CommandError {}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Address parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressParseError {
    /// Not six colon-separated groups.
    WrongLength,
    /// A group is not a two-digit hexadecimal byte.
    InvalidHex,
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength => write!(f, "expected six colon-separated bytes"),
            Self::InvalidHex => write!(f, "invalid hexadecimal byte"),
        }
    }
}

impl From<AddressParseError> for Error {
    fn from(e: AddressParseError) -> Self {
        Self::Address(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Outcome of a thermostat command method.
pub type CommandResult = core::result::Result<(), CommandError>;
