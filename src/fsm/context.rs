//! Shared mutable context threaded through every FSM handler.
//!
//! `CommandContext` is the single struct that state handlers read from and
//! write to.  The driver fills in the clock reading and the "result
//! received" flag before each tick; handlers arm the deadline and request
//! side effects through [`SessionActions`], which the driver applies after
//! the tick.  Think of it as the "blackboard" in a blackboard architecture.

use crate::address::DeviceAddress;
use crate::error::CommandError;

// ---------------------------------------------------------------------------
// Side-effect requests (written by state handlers; consumed by the driver)
// ---------------------------------------------------------------------------

/// What the driver must do once a command reaches a terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionActions {
    /// Unsubscribe and disconnect the open session.
    pub teardown: bool,
    /// Mark the target's status record as invalid.
    pub invalidate_target: bool,
}

impl SessionActions {
    pub fn none() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// CommandContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
#[derive(Debug)]
pub struct CommandContext {
    // -- Timing --
    /// Clock reading for the current tick (milliseconds).
    pub now_ms: u64,
    /// Window between the frame write and the required status report.
    pub command_timeout_ms: u32,
    /// Absolute timeout, armed on entry to `AwaitingResult`.
    pub deadline_ms: Option<u64>,

    // -- Command --
    /// Thermostat the in-flight command is addressed to.
    pub target: Option<DeviceAddress>,
    /// Set by the driver when a status report from `target` was applied.
    pub result_received: bool,
    /// Why the command failed, once it has.
    pub failure: Option<CommandError>,

    // -- Outputs --
    pub actions: SessionActions,
}

impl CommandContext {
    pub fn new(command_timeout_ms: u32) -> Self {
        Self {
            now_ms: 0,
            command_timeout_ms,
            deadline_ms: None,
            target: None,
            result_received: false,
            failure: None,
            actions: SessionActions::none(),
        }
    }

    /// Forget everything about the previous command.
    pub fn reset(&mut self) {
        self.deadline_ms = None;
        self.target = None;
        self.result_received = false;
        self.failure = None;
        self.actions = SessionActions::none();
    }

    /// `true` once the clock has reached the armed deadline.
    pub fn deadline_passed(&self) -> bool {
        self.deadline_ms.is_some_and(|d| self.now_ms >= d)
    }
}
