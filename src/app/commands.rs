//! Inbound command requests.
//!
//! A [`CommandRequest`] is what every per-operation method on the
//! [`TrvDriver`](super::service::TrvDriver) builds before handing it to
//! the state machine.  It is consumed immediately and never stored.

use crate::address::DeviceAddress;
use crate::codec::{CommandFrame, TrvCommand};

/// How the caller wants to learn the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    /// Block until the status report arrives or the command times out.
    Sync,
    /// Return once the frame is written; the caller polls for completion.
    Async,
}

/// A single command addressed to one thermostat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandRequest {
    pub target: DeviceAddress,
    pub command: TrvCommand,
    pub frame: CommandFrame,
    pub mode: CommandMode,
}

impl CommandRequest {
    pub fn new(target: DeviceAddress, command: TrvCommand, mode: CommandMode) -> Self {
        Self {
            target,
            command,
            frame: command.encode(),
            mode,
        }
    }
}
