//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                        │
//! │  ┌───────────┬──────────────┬──────────────┬─────────────────────┐ │
//! │  │ PrintState│ on_enter     │ on_exit      │ on_update           │ │
//! │  ├───────────┼──────────────┼──────────────┼─────────────────────┤ │
//! │  │ Idle      │ -            │ -            │ fn(ctx, io)->Result │ │
//! │  │ Working   │ fn(ctx, io)  │ -            │ fn(ctx, io)->Result │ │
//! │  │ Pausing   │ fn(ctx, io)  │ -            │ fn(ctx, io)->Result │ │
//! │  │ Paused    │ fn(ctx, io)  │ -            │ fn(ctx, io)->Result │ │
//! │  │ Resuming  │ -            │ -            │ fn(ctx, io)->Result │ │
//! │  │ Reprinted │ -            │ -            │ fn(ctx, io)->Result │ │
//! │  └───────────┴──────────────┴──────────────┴─────────────────────┘ │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! `Ok(Some(next))` runs `on_exit` for the current state, then `on_enter`
//! for the next.  `Err(_)` leaves the state untouched so the step is
//! retried on the next tick.  Handlers receive the session blackboard and
//! the printer collaborator bundle `IO`.

pub mod context;
pub mod states;

use context::SessionContext;
use log::info;

use crate::app::events::SessionEvent;
use crate::error::Error;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Print-session states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrintState {
    Idle = 0,
    Working = 1,
    Pausing = 2,
    Paused = 3,
    Resuming = 4,
    Reprinted = 5,
}

impl PrintState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 6;

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Working => "Working",
            Self::Pausing => "Pausing",
            Self::Paused => "Paused",
            Self::Resuming => "Resuming",
            Self::Reprinted => "Reprinted",
        }
    }
}

impl core::fmt::Display for PrintState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` action.  Runs exactly once per transition.
pub type StateActionFn<IO> = fn(&mut SessionContext, &mut IO);

/// Per-tick update handler.
pub type StateUpdateFn<IO> = fn(&mut SessionContext, &mut IO) -> Result<Option<PrintState>, Error>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor<IO> {
    pub id: PrintState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<IO>>,
    pub on_exit: Option<StateActionFn<IO>>,
    pub on_update: StateUpdateFn<IO>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm<IO> {
    /// Fixed-size table indexed by `PrintState as usize`.
    table: [StateDescriptor<IO>; PrintState::COUNT],
    current: PrintState,
}

impl<IO> Fsm<IO> {
    pub fn new(table: [StateDescriptor<IO>; PrintState::COUNT], initial: PrintState) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut SessionContext, io: &mut IO) {
        info!("FSM starting in state: {}", self.descriptor().name);
        if let Some(enter) = self.descriptor().on_enter {
            enter(ctx, io);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. On `Ok(Some(next))`: `on_exit(current)` → update → `on_enter(next)`.
    /// 3. On `Err(_)`: stay, hand the error back.
    pub fn tick(&mut self, ctx: &mut SessionContext, io: &mut IO) -> Result<(), Error> {
        let next = (self.descriptor().on_update)(ctx, io)?;

        if let Some(next_id) = next {
            if next_id != self.current {
                self.transition(next_id, ctx, io);
            }
        }
        Ok(())
    }

    /// Jump straight to `next` (accepted external requests).
    pub fn force_transition(&mut self, next: PrintState, ctx: &mut SessionContext, io: &mut IO) {
        if next != self.current {
            self.transition(next, ctx, io);
        }
    }

    pub fn current_state(&self) -> PrintState {
        self.current
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn descriptor(&self) -> &StateDescriptor<IO> {
        &self.table[self.current as usize]
    }

    fn transition(&mut self, next: PrintState, ctx: &mut SessionContext, io: &mut IO) {
        let from = self.current;
        info!(
            "FSM transition: {} -> {}",
            self.descriptor().name,
            self.table[next as usize].name
        );

        if let Some(exit) = self.descriptor().on_exit {
            exit(ctx, io);
        }

        self.current = next;
        ctx.notify(SessionEvent::StateChanged { from, to: next });

        if let Some(enter) = self.descriptor().on_enter {
            enter(ctx, io);
        }
    }
}
