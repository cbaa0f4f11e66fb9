//! Host simulation of the printer around the session.
//!
//! [`SimPrinter`] implements every collaborator port with just enough
//! behaviour for the session to be driven end to end: a command log,
//! positioning mode and head position, a buffered backlog, transport pause
//! state, a screen stack, a stored session record and recovery data.
//! Fault injection hooks let tests exercise each error path.
//!
//! [`SimPin`] is an `InputPin` whose level is shared with the test or
//! scenario driving it.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin};

use crate::app::machine::MachineCommand;
use crate::app::ports::{
    CommandPort, MotionPort, PreviewSource, PrintTimerPort, RecoveryPort, Screen, SessionStore,
    StorageError, TransportPort, UiPort,
};
use crate::checkpoint::{Axis, Position, SessionRecord};
use crate::error::{CommandError, MotionError, RecoveryError};

// ───────────────────────────────────────────────────────────────
// Printer
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SimPrinter {
    // motion
    position: Position,
    relative: bool,
    motion_drain_fails: bool,

    // command executor
    executed: Vec<MachineCommand>,
    enqueued: Vec<MachineCommand>,
    backlog: usize,
    backlog_stalled: bool,
    failing_command: Option<MachineCommand>,

    // transport & timer
    transport_paused: bool,
    timer_running: bool,

    // ui
    screens: Vec<Screen>,
    screen_visible: bool,
    preview: Option<PreviewSource>,

    // storage
    stored: Option<SessionRecord>,
    failing_saves: u32,
    save_attempts: u32,

    // power-loss recovery
    recovery_targets: Vec<i16>,
    active_tool: u8,
    recovery_fails: bool,
    recovery_resumes: u32,
}

impl SimPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh machine after a power cycle: everything volatile is lost,
    /// the stored session record and recovery data survive.
    pub fn power_cycle(&self) -> Self {
        Self {
            stored: self.stored,
            recovery_targets: self.recovery_targets.clone(),
            active_tool: self.active_tool,
            ..Self::default()
        }
    }

    // ── Scenario setup ────────────────────────────────────────

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn push_backlog(&mut self, commands: usize) {
        self.backlog += commands;
    }

    /// Backlog advances succeed but never shrink the queue.
    pub fn stall_backlog(&mut self, stalled: bool) {
        self.backlog_stalled = stalled;
    }

    pub fn fail_motion_drain(&mut self, fail: bool) {
        self.motion_drain_fails = fail;
    }

    /// Reject every execution of `command`.
    pub fn fail_command_matching(&mut self, command: MachineCommand) {
        self.failing_command = Some(command);
    }

    /// Fail the next `count` session saves.
    pub fn fail_saves(&mut self, count: u32) {
        self.failing_saves = count;
    }

    pub fn set_transport_paused(&mut self, paused: bool) {
        self.transport_paused = paused;
    }

    pub fn set_recovery_targets(&mut self, targets: &[i16]) {
        self.recovery_targets = targets.to_vec();
    }

    pub fn fail_recovery_resume(&mut self, fail: bool) {
        self.recovery_fails = fail;
    }

    pub fn clear_log(&mut self) {
        self.executed.clear();
        self.enqueued.clear();
    }

    // ── Observation ───────────────────────────────────────────

    pub fn executed(&self) -> &[MachineCommand] {
        &self.executed
    }

    pub fn enqueued(&self) -> &[MachineCommand] {
        &self.enqueued
    }

    pub fn current_position(&self) -> Position {
        self.position
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    pub fn timer_running(&self) -> bool {
        self.timer_running
    }

    pub fn screen(&self) -> Option<Screen> {
        if self.screen_visible {
            self.screens.last().copied()
        } else {
            None
        }
    }

    pub fn preview(&self) -> Option<PreviewSource> {
        self.preview
    }

    pub fn stored_session(&self) -> Option<SessionRecord> {
        self.stored
    }

    pub fn save_attempts(&self) -> u32 {
        self.save_attempts
    }

    pub fn recovery_resumes(&self) -> u32 {
        self.recovery_resumes
    }

    fn apply_move(&mut self, axis: Axis, mm: f32) {
        let slot = match axis {
            Axis::X => &mut self.position.x,
            Axis::Y => &mut self.position.y,
            Axis::Z => &mut self.position.z,
            Axis::E => &mut self.position.e,
        };
        if self.relative {
            *slot += mm;
        } else {
            *slot = mm;
        }
    }
}

impl CommandPort for SimPrinter {
    fn execute(&mut self, command: &MachineCommand) -> Result<(), CommandError> {
        if self.failing_command.as_ref() == Some(command) {
            return Err(CommandError::Rejected);
        }
        self.executed.push(command.clone());
        match *command {
            MachineCommand::PauseJob => self.transport_paused = true,
            MachineCommand::ResumeJob => self.transport_paused = false,
            MachineCommand::RelativePositioning => self.relative = true,
            MachineCommand::AbsolutePositioning => self.relative = false,
            MachineCommand::Move { axis, mm } => self.apply_move(axis, mm),
            MachineCommand::SelectTool(tool) => self.active_tool = tool,
            MachineCommand::HeatAndWait { .. } | MachineCommand::Raw(_) => {}
        }
        Ok(())
    }

    fn enqueue(&mut self, command: &MachineCommand) -> Result<(), CommandError> {
        if self.failing_command.as_ref() == Some(command) {
            return Err(CommandError::QueueFull);
        }
        self.enqueued.push(command.clone());
        Ok(())
    }

    fn backlog_len(&self) -> usize {
        self.backlog
    }

    fn advance_backlog(&mut self) -> Result<(), CommandError> {
        if !self.backlog_stalled {
            self.backlog = self.backlog.saturating_sub(1);
        }
        Ok(())
    }
}

impl MotionPort for SimPrinter {
    fn wait_for_idle(&mut self, timeout_ms: u32) -> Result<(), MotionError> {
        if self.motion_drain_fails {
            Err(MotionError::DrainTimeout {
                waited_ms: timeout_ms,
            })
        } else {
            Ok(())
        }
    }

    fn position(&self) -> Position {
        self.position
    }
}

impl TransportPort for SimPrinter {
    fn pause_transfer(&mut self) {
        self.transport_paused = true;
    }

    fn is_paused(&self) -> bool {
        self.transport_paused
    }
}

impl PrintTimerPort for SimPrinter {
    fn start_timer(&mut self) {
        self.timer_running = true;
    }

    fn stop_timer(&mut self) {
        self.timer_running = false;
    }
}

impl UiPort for SimPrinter {
    fn clear_screen(&mut self) {
        self.screen_visible = false;
    }

    fn show(&mut self, screen: Screen) {
        self.screens.push(screen);
        self.screen_visible = true;
    }

    fn show_previous(&mut self) {
        self.screens.pop();
        self.screen_visible = true;
    }

    fn set_preview(&mut self, source: PreviewSource) {
        self.preview = Some(source);
    }
}

impl SessionStore for SimPrinter {
    fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        Ok(self.stored)
    }

    fn save_session(&mut self, record: &SessionRecord) -> Result<(), StorageError> {
        self.save_attempts += 1;
        if self.failing_saves > 0 {
            self.failing_saves -= 1;
            return Err(StorageError::IoError);
        }
        self.stored = Some(*record);
        Ok(())
    }
}

impl RecoveryPort for SimPrinter {
    fn heater_count(&self) -> u8 {
        self.recovery_targets.len() as u8
    }

    fn target_temperature(&self, heater: u8) -> i16 {
        self.recovery_targets
            .get(usize::from(heater))
            .copied()
            .unwrap_or(0)
    }

    fn active_tool(&self) -> u8 {
        self.active_tool
    }

    fn resume(&mut self) -> Result<(), RecoveryError> {
        if self.recovery_fails {
            return Err(RecoveryError::ResumeFailed);
        }
        self.recovery_resumes += 1;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Pin
// ───────────────────────────────────────────────────────────────

/// Input pin with a level shared between clones.
#[derive(Debug, Clone)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(high)),
        }
    }

    pub fn set_level(&self, high: bool) {
        self.level.set(high);
    }

    pub fn level(&self) -> bool {
        self.level.get()
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}
