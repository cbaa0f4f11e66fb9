//! Print session: the hexagonal core.
//!
//! [`PrintSession`] owns the FSM, the session blackboard and the filament
//! sensors.  External actors talk to it through a shared
//! [`TransitionRequests`] handoff; printer I/O flows through the port
//! bundle passed into each call, so the whole session runs against mock
//! adapters in tests.
//!
//! ```text
//!  TransitionRequests ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!                         │        PrintSession         │
//!  SensorBank ──────────▶ │  FSM · detector · persist   │ ◀─▶ PrinterPorts
//!                         └────────────────────────────┘
//! ```

use embedded_hal::digital::InputPin;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::Error;
use crate::fsm::context::SessionContext;
use crate::fsm::states::{build_state_table, freeze, persist};
use crate::fsm::{Fsm, PrintState};
use crate::requests::TransitionRequests;
use crate::sensors::{RunoutPolicy, SensorBank};

use super::commands::SessionCommand;
use super::events::{SessionEvent, SessionStatus};
use super::ports::{EventSink, PrinterPorts, SessionStore};

/// Whether an external request for `to` is legal while in `from`.
pub fn request_allowed(from: PrintState, to: PrintState) -> bool {
    match to {
        PrintState::Working => from == PrintState::Idle,
        PrintState::Pausing => from == PrintState::Working,
        PrintState::Resuming => from == PrintState::Paused,
        PrintState::Reprinted => {
            cfg!(feature = "power-loss-recovery") && from == PrintState::Idle
        }
        PrintState::Idle => true,
        // Only the pause sequence itself lands in Paused.
        PrintState::Paused => false,
    }
}

// ───────────────────────────────────────────────────────────────
// PrintSession
// ───────────────────────────────────────────────────────────────

pub struct PrintSession<'r, P, IO> {
    fsm: Fsm<IO>,
    ctx: SessionContext,
    sensors: SensorBank<P>,
    requests: &'r TransitionRequests,
}

impl<'r, P: InputPin, IO: PrinterPorts> PrintSession<'r, P, IO> {
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(
        config: SystemConfig,
        sensors: SensorBank<P>,
        requests: &'r TransitionRequests,
    ) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), PrintState::Idle),
            ctx: SessionContext::new(config),
            sensors,
            requests,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the persisted record so a power-loss reprint knows whether
    /// the job was paused.  A missing record is a clean first boot.
    pub fn restore(&mut self, store: &impl SessionStore) -> Result<(), Error> {
        match store.load_session()? {
            Some(record) => {
                info!(
                    "restored session record (paused: {}, checkpoint: {})",
                    record.pause_reprint,
                    record.checkpoint.is_some()
                );
                self.ctx.pause_reprint = record.pause_reprint;
                self.ctx.checkpoint = record.checkpoint;
            }
            None => info!("no stored session record"),
        }
        Ok(())
    }

    pub fn start(&mut self, io: &mut IO, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx, io);
        sink.emit(&SessionEvent::Started(self.fsm.current_state()));
        self.flush(sink);
        info!("PrintSession started in {}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One cooperative cycle: requests → pending save → sensors → FSM.
    ///
    /// Returns the first error of the tick.  Every error is also emitted
    /// as [`SessionEvent::Fault`].
    pub fn tick(
        &mut self,
        now_ms: u32,
        io: &mut IO,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        self.ctx.now_ms = now_ms;
        let retry_save = self.ctx.persist_pending;

        // 1. Requests posted since the last tick
        if self.requests.take_rearm() {
            info!("filament monitor re-armed");
            self.ctx.detector.rearm();
        }
        if let Some(requested) = self.requests.take() {
            self.apply_request(requested, io);
        }
        if self.requests.take_leveling() {
            self.accept_leveling();
        }

        // 2. Deferred persistence
        if retry_save && self.ctx.persist_pending {
            match persist(&mut self.ctx, io) {
                Ok(()) => info!("deferred session save succeeded"),
                Err(e) => self.ctx.raise(e),
            }
        }

        // 3. Filament sample (only meaningful while printing)
        if self.fsm.current_state() == PrintState::Working {
            self.ctx.filament = self.sensors.sample();
        }

        // 4. FSM
        if let Err(e) = self.fsm.tick(&mut self.ctx, io) {
            self.ctx.raise(e);
        }

        // 5. Events
        self.flush(sink);
        match self.ctx.take_fault() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ── Requests & commands ───────────────────────────────────

    /// Post a requested state.  Consumed at the start of the next tick.
    pub fn request(&self, state: PrintState) {
        self.requests.request(state);
    }

    pub fn requests(&self) -> &'r TransitionRequests {
        self.requests
    }

    /// Map an operator command onto the request handoff or the live
    /// configuration.
    pub fn handle_command(&mut self, cmd: SessionCommand) -> Result<(), Error> {
        match cmd {
            SessionCommand::Start => self.request(PrintState::Working),
            SessionCommand::Pause => self.request(PrintState::Pausing),
            SessionCommand::Resume => self.request(PrintState::Resuming),
            SessionCommand::Stop => self.request(PrintState::Idle),
            SessionCommand::Reprint => self.request(PrintState::Reprinted),
            SessionCommand::AutoLevel => self.requests.arm_leveling(),
            SessionCommand::RearmRunout => self.requests.rearm_runout(),
            SessionCommand::UpdateConfig(config) => {
                config.validate()?;
                self.ctx.apply_config(config);
                info!("Configuration updated at runtime");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> PrintState {
        self.fsm.current_state()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.fsm.current_state(),
            checkpoint: self.ctx.checkpoint,
            pause_reprint: self.ctx.pause_reprint,
            persist_pending: self.ctx.persist_pending,
            runout_strategy: self.ctx.detector.strategy(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_request(&mut self, requested: PrintState, io: &mut IO) {
        let current = self.fsm.current_state();
        if !request_allowed(current, requested) {
            warn!("request {} rejected in {}", requested, current);
            self.ctx.notify(SessionEvent::RequestRejected {
                requested,
                current,
            });
            return;
        }

        match requested {
            PrintState::Pausing => freeze(io),
            PrintState::Idle => {
                io.stop_timer();
                self.ctx.leveling_requested = false;
                if self.ctx.consume_checkpoint().is_some() {
                    info!("checkpoint discarded");
                }
                if let Err(e) = persist(&mut self.ctx, io) {
                    self.ctx.raise(e);
                }
            }
            _ => {}
        }
        self.fsm.force_transition(requested, &mut self.ctx, io);
    }

    /// Leveling only runs from `Idle` or `Working`.  Anywhere else the
    /// request is dropped so it cannot fire in the middle of a resumed job.
    fn accept_leveling(&mut self) {
        let current = self.fsm.current_state();
        if matches!(current, PrintState::Idle | PrintState::Working) {
            self.ctx.leveling_requested = true;
        } else {
            warn!("auto-leveling rejected in {}", current);
            self.ctx.notify(SessionEvent::LevelingRejected { current });
        }
    }

    fn flush(&mut self, sink: &mut impl EventSink) {
        self.ctx.drain_events(|event| sink.emit(&event));
    }
}
