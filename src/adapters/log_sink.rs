//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing session events through the `log`
//! facade (serial console on the printer, stderr in the simulator).

use log::{info, warn};

use crate::app::events::SessionEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SessionEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            SessionEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            SessionEvent::RequestRejected { requested, current } => {
                warn!("REQ   | {} rejected while {}", requested, current);
            }
            SessionEvent::RunoutDetected { sensor } => {
                warn!("RUNOUT| sensor={}", sensor);
            }
            SessionEvent::CheckpointSaved(cp) => {
                info!(
                    "CKPT  | X={:?} Y={:?} Z={:?} E={:?}",
                    cp.x, cp.y, cp.z, cp.e
                );
            }
            SessionEvent::LevelingStarted => {
                info!("LEVEL | script queued");
            }
            SessionEvent::LevelingRejected { current } => {
                warn!("LEVEL | request dropped while {}", current);
            }
            SessionEvent::Fault(err) => {
                warn!("FAULT | {}", err);
            }
        }
    }
}
