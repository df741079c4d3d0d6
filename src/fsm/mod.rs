//! Table-driven state machine for the command lifecycle.
//!
//! Every state is one [`StateDescriptor`] row holding plain function
//! pointers.  The table is indexed by `StateId as usize`, so a lookup is
//! a single array access and the whole machine is `'static` data plus one
//! index.
//!
//! ```text
//!   state            enter   exit    update
//!   ───────────────  ──────  ──────  ─────────────────────────────
//!   Idle             reset   -       hold
//!   Connecting       clear   -       hold
//!   AwaitingResult   arm     disarm  report? Completed : deadline? TimedOut
//!   Completed        teardown        hold
//!   TimedOut         teardown + invalidate   hold
//!   Failed           teardown + invalidate   hold
//! ```
//!
//! Only `AwaitingResult` moves on its own, from [`Fsm::tick`].  Steps that
//! depend on transport results (session open, frame written, failure,
//! settle) are driven from outside with [`Fsm::force_transition`].

pub mod context;
pub mod states;

use context::CommandContext;
use log::debug;

/// Lifecycle of a single command.  Discriminants are table indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Connecting = 1,
    AwaitingResult = 2,
    Completed = 3,
    TimedOut = 4,
    Failed = 5,
}

impl StateId {
    /// Number of rows in the state table.
    pub const COUNT: usize = 6;

    /// A command in this state is finished and waiting to be settled.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut | Self::Failed)
    }
}

/// Enter or exit hook.
pub type StateActionFn = fn(&mut CommandContext);

/// Per-tick hook; `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut CommandContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// Command state machine: a fixed table and the active row.
pub struct Fsm {
    table: [StateDescriptor; StateId::COUNT],
    active: StateId,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            active: initial,
        }
    }

    /// Run the initial state's enter hook.  Call once before ticking.
    pub fn start(&mut self, ctx: &mut CommandContext) {
        debug!("FSM: start in {}", self.current_name());
        if let Some(enter) = self.row(self.active).on_enter {
            enter(ctx);
        }
    }

    /// Evaluate the active state's update hook and follow its answer.
    pub fn tick(&mut self, ctx: &mut CommandContext) {
        if let Some(next) = (self.row(self.active).on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    /// Move to `next` without consulting the update hook.  A no-op when
    /// `next` is already active.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut CommandContext) {
        if next != self.active {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        self.active
    }

    pub fn current_name(&self) -> &'static str {
        self.row(self.active).name
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.table[id as usize]
    }

    fn transition(&mut self, next: StateId, ctx: &mut CommandContext) {
        debug!("FSM: {} -> {}", self.current_name(), self.row(next).name);

        if let Some(exit) = self.row(self.active).on_exit {
            exit(ctx);
        }
        self.active = next;
        if let Some(enter) = self.row(next).on_enter {
            enter(ctx);
        }
    }
}
