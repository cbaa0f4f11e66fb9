//! Session blackboard threaded through every FSM handler.
//!
//! `SessionContext` replaces the printer-wide globals a UI layer would
//! otherwise poke at: it owns the filament detector, the latest sensor
//! snapshot, the checkpoint, the pause flag and the configuration.  The
//! session owns exactly one and lends it to the monitor and the recovery
//! bridge by reference.

use heapless::Vec;
use log::warn;

use crate::app::events::SessionEvent;
use crate::checkpoint::{PositionCheckpoint, SessionRecord};
use crate::config::SystemConfig;
use crate::error::Error;
use crate::sensors::{FilamentDetector, FilamentSnapshot};

/// Events buffered during one tick before they reach the sink.
pub const OUTBOX_CAP: usize = 8;

pub struct SessionContext {
    // -- Timing --
    /// Millisecond clock supplied by the scheduler (wraps).
    pub now_ms: u32,

    // -- Configuration --
    pub config: SystemConfig,

    // -- Filament monitor --
    /// Latest sample.  Refreshed only while `Working`.
    pub filament: FilamentSnapshot,
    pub detector: FilamentDetector,

    // -- Persisted session state --
    pub checkpoint: Option<PositionCheckpoint>,
    /// The job was paused when the record was last written.
    pub pause_reprint: bool,
    /// The last record could not be written and is retried each tick.
    pub persist_pending: bool,

    // -- Edge-triggered requests --
    pub leveling_requested: bool,

    outbox: Vec<SessionEvent, OUTBOX_CAP>,
    first_fault: Option<Error>,
}

impl SessionContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            filament: FilamentSnapshot::default(),
            detector: FilamentDetector::from_config(&config),
            checkpoint: None,
            pause_reprint: false,
            persist_pending: false,
            leveling_requested: false,
            config,
            outbox: Vec::new(),
            first_fault: None,
        }
    }

    /// Queue an event for the sink.
    pub fn notify(&mut self, event: SessionEvent) {
        if let Err(dropped) = self.outbox.push(event) {
            warn!("session outbox full, dropping {:?}", dropped);
        }
    }

    /// Report a failure that does not abort the current step.
    pub fn raise(&mut self, err: Error) {
        warn!("session fault: {}", err);
        if self.first_fault.is_none() {
            self.first_fault = Some(err);
        }
        self.notify(SessionEvent::Fault(err));
    }

    /// First fault raised since the last call.
    pub fn take_fault(&mut self) -> Option<Error> {
        self.first_fault.take()
    }

    /// Hand buffered events to `f` in FIFO order.
    pub fn drain_events(&mut self, mut f: impl FnMut(SessionEvent)) {
        for event in core::mem::take(&mut self.outbox) {
            f(event);
        }
    }

    /// The record that represents this session on durable storage.
    pub fn session_record(&self) -> SessionRecord {
        SessionRecord {
            pause_reprint: self.pause_reprint,
            checkpoint: self.checkpoint,
        }
    }

    /// Forget the checkpoint and the pause flag (resume done or job stopped).
    pub fn consume_checkpoint(&mut self) -> Option<PositionCheckpoint> {
        self.pause_reprint = false;
        self.checkpoint.take()
    }

    /// Swap in a new configuration and rebuild the detector if its
    /// strategy or tuning changed.
    pub fn apply_config(&mut self, config: SystemConfig) {
        let rebuild = config.runout_strategy != self.config.runout_strategy
            || config.runout_threshold != self.config.runout_threshold
            || config.runout_delay_ms != self.config.runout_delay_ms;
        if rebuild {
            self.detector = FilamentDetector::from_config(&config);
        }
        self.config = config;
    }
}
