//! Mock printer adapter for integration tests.
//!
//! Records every port call so tests can assert on the full command
//! history without a motion system, SD card or screen.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use printctl::app::events::SessionEvent;
use printctl::app::machine::MachineCommand;
use printctl::app::ports::{
    CommandPort, EventSink, MotionPort, PreviewSource, PrintTimerPort, RecoveryPort, Screen,
    SessionStore, StorageError, TransportPort, UiPort,
};
use printctl::checkpoint::{Position, SessionRecord};
use printctl::error::{CommandError, MotionError, RecoveryError};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    Execute(String),
    Enqueue(String),
    AdvanceBacklog,
    WaitForIdle(u32),
    PauseTransfer,
    StartTimer,
    StopTimer,
    ClearScreen,
    Show(Screen),
    ShowPrevious,
    SetPreview(PreviewSource),
    SaveSession(SessionRecord),
    RecoveryResume,
}

// ── MockPrinter ───────────────────────────────────────────────

pub struct MockPrinter {
    pub calls: Vec<PortCall>,
    pub position: Position,
    pub backlog: usize,
    pub transport_paused: bool,
    pub stored: Option<SessionRecord>,
    pub heaters: Vec<i16>,
    pub active_tool: u8,
    /// Rendered G-code line that `execute` rejects.
    pub reject_gcode: Option<String>,
    pub drain_times_out: bool,
    pub failing_saves: u32,
    pub recovery_fails: bool,
}

#[allow(dead_code)]
impl MockPrinter {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            position: Position::default(),
            backlog: 0,
            transport_paused: false,
            stored: None,
            heaters: Vec::new(),
            active_tool: 0,
            reject_gcode: None,
            drain_times_out: false,
            failing_saves: 0,
            recovery_fails: false,
        }
    }

    /// Rendered G-code of every executed command, in order.
    pub fn gcode(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Execute(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn queued(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Enqueue(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &PortCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn saves(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PortCall::SaveSession(_)))
            .count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandPort for MockPrinter {
    fn execute(&mut self, command: &MachineCommand) -> Result<(), CommandError> {
        let line = command.to_string();
        if self.reject_gcode.as_deref() == Some(line.as_str()) {
            return Err(CommandError::Rejected);
        }
        match command {
            MachineCommand::PauseJob => self.transport_paused = true,
            MachineCommand::ResumeJob => self.transport_paused = false,
            _ => {}
        }
        self.calls.push(PortCall::Execute(line));
        Ok(())
    }

    fn enqueue(&mut self, command: &MachineCommand) -> Result<(), CommandError> {
        self.calls.push(PortCall::Enqueue(command.to_string()));
        Ok(())
    }

    fn backlog_len(&self) -> usize {
        self.backlog
    }

    fn advance_backlog(&mut self) -> Result<(), CommandError> {
        self.calls.push(PortCall::AdvanceBacklog);
        self.backlog = self.backlog.saturating_sub(1);
        Ok(())
    }
}

impl MotionPort for MockPrinter {
    fn wait_for_idle(&mut self, timeout_ms: u32) -> Result<(), MotionError> {
        self.calls.push(PortCall::WaitForIdle(timeout_ms));
        if self.drain_times_out {
            return Err(MotionError::DrainTimeout {
                waited_ms: timeout_ms,
            });
        }
        Ok(())
    }

    fn position(&self) -> Position {
        self.position
    }
}

impl TransportPort for MockPrinter {
    fn pause_transfer(&mut self) {
        self.calls.push(PortCall::PauseTransfer);
        self.transport_paused = true;
    }

    fn is_paused(&self) -> bool {
        self.transport_paused
    }
}

impl PrintTimerPort for MockPrinter {
    fn start_timer(&mut self) {
        self.calls.push(PortCall::StartTimer);
    }

    fn stop_timer(&mut self) {
        self.calls.push(PortCall::StopTimer);
    }
}

impl UiPort for MockPrinter {
    fn clear_screen(&mut self) {
        self.calls.push(PortCall::ClearScreen);
    }

    fn show(&mut self, screen: Screen) {
        self.calls.push(PortCall::Show(screen));
    }

    fn show_previous(&mut self) {
        self.calls.push(PortCall::ShowPrevious);
    }

    fn set_preview(&mut self, source: PreviewSource) {
        self.calls.push(PortCall::SetPreview(source));
    }
}

impl SessionStore for MockPrinter {
    fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        Ok(self.stored)
    }

    fn save_session(&mut self, record: &SessionRecord) -> Result<(), StorageError> {
        self.calls.push(PortCall::SaveSession(*record));
        if self.failing_saves > 0 {
            self.failing_saves -= 1;
            return Err(StorageError::IoError);
        }
        self.stored = Some(*record);
        Ok(())
    }
}

impl RecoveryPort for MockPrinter {
    fn heater_count(&self) -> u8 {
        self.heaters.len() as u8
    }

    fn target_temperature(&self, heater: u8) -> i16 {
        self.heaters[usize::from(heater)]
    }

    fn active_tool(&self) -> u8 {
        self.active_tool
    }

    fn resume(&mut self) -> Result<(), RecoveryError> {
        self.calls.push(PortCall::RecoveryResume);
        if self.recovery_fails {
            Err(RecoveryError::ResumeFailed)
        } else {
            Ok(())
        }
    }
}

// ── MockPin ───────────────────────────────────────────────────

/// Level shared with the test.  `None` makes reads fail.
#[derive(Clone)]
pub struct MockPin {
    level: Rc<Cell<Option<bool>>>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn new(high: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(Some(high))),
        }
    }

    pub fn set(&self, high: bool) {
        self.level.set(Some(high));
    }

    pub fn break_wire(&self) {
        self.level.set(None);
    }
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.level.get().ok_or(ErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.level.get().map(|h| !h).ok_or(ErrorKind::Other)
    }
}

// ── Recording sink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SessionEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn faults(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Fault(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}
