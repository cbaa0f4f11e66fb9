//! Inbound commands to the session.
//!
//! These represent actions requested by the outside world (touch UI,
//! host serial, power-loss dialog) that the
//! [`PrintSession`](super::service::PrintSession) interprets and acts upon.

use crate::config::SystemConfig;

/// Commands that external adapters can send into the session core.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Begin printing the selected job.
    Start,

    /// Operator pause.
    Pause,

    /// Continue a paused job.
    Resume,

    /// Abort the job and discard any checkpoint.
    Stop,

    /// Continue a job interrupted by power loss.
    Reprint,

    /// Run the auto bed-leveling script once.
    AutoLevel,

    /// Reset the filament run-out debounce (after a refill).
    RearmRunout,

    /// Hot-reload configuration.  Validated before it is applied.
    UpdateConfig(SystemConfig),
}
