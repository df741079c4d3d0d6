//! Concrete state handler functions and table builder.
//!
//! Each state is a set of plain `fn` pointers with no captured state.
//!
//! ```text
//!  IDLE ──[issue]──▶ CONNECTING ──[frame written]──▶ AWAITING_RESULT
//!    ▲                   │                            │          │
//!    │          [connect/write error]          [report]   [deadline]
//!    │                   ▼                            ▼          ▼
//!    └──[settled]──── FAILED ◀─┐               COMPLETED    TIMED_OUT
//!    ▲                         │                    │            │
//!    └─────────────────────────┴──────[settled]─────┴────────────┘
//! ```
//!
//! Terminal states only record what the driver must do; the driver
//! applies the actions and forces the machine back to IDLE.

use super::context::{CommandContext, SessionActions};
use super::{StateDescriptor, StateId};
use crate::error::CommandError;
use log::{debug, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per driver.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: hold,
        },
        // Index 1: Connecting
        StateDescriptor {
            id: StateId::Connecting,
            name: "Connecting",
            on_enter: Some(connecting_enter),
            on_exit: None,
            on_update: hold,
        },
        // Index 2: AwaitingResult
        StateDescriptor {
            id: StateId::AwaitingResult,
            name: "AwaitingResult",
            on_enter: Some(awaiting_enter),
            on_exit: Some(awaiting_exit),
            on_update: awaiting_update,
        },
        // Index 3: Completed
        StateDescriptor {
            id: StateId::Completed,
            name: "Completed",
            on_enter: Some(completed_enter),
            on_exit: None,
            on_update: hold,
        },
        // Index 4: TimedOut
        StateDescriptor {
            id: StateId::TimedOut,
            name: "TimedOut",
            on_enter: Some(timed_out_enter),
            on_exit: None,
            on_update: hold,
        },
        // Index 5: Failed
        StateDescriptor {
            id: StateId::Failed,
            name: "Failed",
            on_enter: Some(failed_enter),
            on_exit: None,
            on_update: hold,
        },
    ]
}

/// Update handler for states that only leave through `force_transition`.
fn hold(_ctx: &mut CommandContext) -> Option<StateId> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut CommandContext) {
    ctx.reset();
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING: session being opened, frame not yet written
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut CommandContext) {
    ctx.result_received = false;
    ctx.failure = None;
    ctx.actions = SessionActions::none();
    if let Some(target) = ctx.target {
        debug!("CONNECTING: {}", target);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_RESULT: frame written, waiting for the status notification
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_enter(ctx: &mut CommandContext) {
    ctx.deadline_ms = Some(ctx.now_ms + ctx.command_timeout_ms as u64);
}

fn awaiting_update(ctx: &mut CommandContext) -> Option<StateId> {
    if ctx.result_received {
        return Some(StateId::Completed);
    }
    if ctx.deadline_passed() {
        return Some(StateId::TimedOut);
    }
    None
}

fn awaiting_exit(ctx: &mut CommandContext) {
    ctx.deadline_ms = None;
}

// ═══════════════════════════════════════════════════════════════════════════
//  Terminal states
// ═══════════════════════════════════════════════════════════════════════════

fn completed_enter(ctx: &mut CommandContext) {
    ctx.actions = SessionActions {
        teardown: true,
        invalidate_target: false,
    };
}

fn timed_out_enter(ctx: &mut CommandContext) {
    if let Some(target) = ctx.target {
        warn!(
            "TIMED_OUT: no status from {} within {} ms",
            target, ctx.command_timeout_ms
        );
    }
    ctx.failure = Some(CommandError::Timeout);
    ctx.actions = SessionActions {
        teardown: true,
        invalidate_target: true,
    };
}

fn failed_enter(ctx: &mut CommandContext) {
    if ctx.failure.is_none() {
        ctx.failure = Some(CommandError::ConnectFailed);
    }
    ctx.actions = SessionActions {
        teardown: true,
        invalidate_target: true,
    };
}
