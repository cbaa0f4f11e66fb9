//! Power-loss reprint through the full session.

use crate::mock_printer::{MockPin, MockPrinter, PortCall, RecordingSink};

use printctl::PrintSession;
use printctl::app::commands::SessionCommand;
use printctl::app::events::SessionEvent;
use printctl::checkpoint::{Position, PositionCheckpoint, SessionRecord};
use printctl::config::SystemConfig;
use printctl::error::{Error, RecoveryError};
use printctl::fsm::PrintState;
use printctl::requests::TransitionRequests;
use printctl::sensors::SensorBank;

fn boot<'r>(
    requests: &'r TransitionRequests,
    hw: &mut MockPrinter,
    sink: &mut RecordingSink,
) -> PrintSession<'r, MockPin, MockPrinter> {
    let bank = SensorBank::from_pins([MockPin::new(true)], false);
    let mut session = PrintSession::new(SystemConfig::default(), bank, requests);
    session.restore(&*hw).unwrap();
    session.start(hw, sink);
    session
}

fn paused_record() -> SessionRecord {
    SessionRecord {
        pause_reprint: true,
        checkpoint: Some(PositionCheckpoint::capture(Position {
            x: 10.0,
            y: 20.0,
            z: 0.6,
            e: 55.0,
        })),
    }
}

#[test]
fn single_hotend_reprint_skips_tool_select() {
    let requests = TransitionRequests::new();
    let mut hw = MockPrinter::new();
    hw.heaters = vec![210];
    let mut sink = RecordingSink::new();
    let mut session = boot(&requests, &mut hw, &mut sink);

    session.handle_command(SessionCommand::Reprint).unwrap();
    session.tick(50, &mut hw, &mut sink).unwrap();

    assert_eq!(session.state(), PrintState::Working);
    assert_eq!(hw.gcode(), vec!["M109 S210"]);
    assert_eq!(hw.count(&PortCall::RecoveryResume), 1);
    assert_eq!(hw.count(&PortCall::StartTimer), 1);
}

#[test]
fn multi_hotend_reprint_heats_each_active_tool() {
    let requests = TransitionRequests::new();
    let mut hw = MockPrinter::new();
    hw.heaters = vec![215, 0, 240];
    hw.active_tool = 2;
    let mut sink = RecordingSink::new();
    let mut session = boot(&requests, &mut hw, &mut sink);

    session.handle_command(SessionCommand::Reprint).unwrap();
    session.tick(50, &mut hw, &mut sink).unwrap();

    assert_eq!(hw.gcode(), vec!["T0", "M109 S215", "T2", "M109 S240"]);
}

#[test]
fn paused_job_survives_power_cycle() {
    let requests = TransitionRequests::new();
    let mut hw = MockPrinter::new();
    hw.heaters = vec![200];
    hw.stored = Some(paused_record());
    let mut sink = RecordingSink::new();
    let mut session = boot(&requests, &mut hw, &mut sink);

    let status = session.status();
    assert_eq!(status.state, PrintState::Idle);
    assert!(status.pause_reprint);
    assert!(status.checkpoint.is_some());

    session.handle_command(SessionCommand::Reprint).unwrap();
    session.tick(50, &mut hw, &mut sink).unwrap();

    assert_eq!(session.state(), PrintState::Working);
    // The reprint consumed the record.
    assert_eq!(hw.stored, Some(SessionRecord::default()));
    assert!(!session.status().pause_reprint);
}

#[test]
fn failed_recovery_resume_holds_and_retries() {
    let requests = TransitionRequests::new();
    let mut hw = MockPrinter::new();
    hw.heaters = vec![200];
    hw.recovery_fails = true;
    let mut sink = RecordingSink::new();
    let mut session = boot(&requests, &mut hw, &mut sink);

    session.handle_command(SessionCommand::Reprint).unwrap();
    assert_eq!(
        session.tick(50, &mut hw, &mut sink),
        Err(Error::Recovery(RecoveryError::ResumeFailed))
    );
    assert_eq!(session.state(), PrintState::Reprinted);
    assert!(sink
        .events
        .contains(&SessionEvent::Fault(Error::Recovery(RecoveryError::ResumeFailed))));

    hw.recovery_fails = false;
    session.tick(100, &mut hw, &mut sink).unwrap();
    assert_eq!(session.state(), PrintState::Working);
    assert_eq!(hw.count(&PortCall::RecoveryResume), 2);
}

#[test]
fn reprint_only_accepted_from_idle() {
    let requests = TransitionRequests::new();
    let mut hw = MockPrinter::new();
    let mut sink = RecordingSink::new();
    let mut session = boot(&requests, &mut hw, &mut sink);

    session.handle_command(SessionCommand::Start).unwrap();
    session.tick(50, &mut hw, &mut sink).unwrap();
    session.handle_command(SessionCommand::Reprint).unwrap();
    session.tick(100, &mut hw, &mut sink).unwrap();

    assert_eq!(session.state(), PrintState::Working);
    assert!(sink.events.contains(&SessionEvent::RequestRejected {
        requested: PrintState::Reprinted,
        current: PrintState::Working,
    }));
    assert_eq!(hw.count(&PortCall::RecoveryResume), 0);
}
