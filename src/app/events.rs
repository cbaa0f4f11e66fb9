//! Outbound session events.
//!
//! The [`PrintSession`](super::service::PrintSession) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, push to the UI, etc.

use crate::checkpoint::PositionCheckpoint;
use crate::config::RunoutStrategy;
use crate::error::Error;
use crate::fsm::PrintState;

/// Structured events emitted by the session core.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session has started (carries initial state).
    Started(PrintState),

    /// The FSM transitioned between states.
    StateChanged { from: PrintState, to: PrintState },

    /// An external request was not legal from the current state.
    RequestRejected {
        requested: PrintState,
        current: PrintState,
    },

    /// The filament monitor fired for `sensor`.
    RunoutDetected { sensor: usize },

    /// A pause captured a new checkpoint.
    CheckpointSaved(PositionCheckpoint),

    /// The leveling script was queued.
    LevelingStarted,

    /// An auto-leveling request arrived outside `Idle`/`Working`, or a
    /// run-out pre-empted it.  It is dropped, never deferred.
    LevelingRejected { current: PrintState },

    /// A step failed.  The session keeps running.
    Fault(Error),
}

/// A point-in-time view of the session, suitable for a status screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStatus {
    pub state: PrintState,
    pub checkpoint: Option<PositionCheckpoint>,
    pub pause_reprint: bool,
    /// The last session record could not be written yet.
    pub persist_pending: bool,
    pub runout_strategy: RunoutStrategy,
}
