//! Concrete state handler functions and table builder.
//!
//! Each state is three plain `fn` pointers, monomorphised over the
//! collaborator bundle.  No closures, no dynamic dispatch, no heap.
//!
//! ```text
//!  IDLE ──[start]──▶ WORKING ──[run-out / pause]──▶ PAUSING ──▶ PAUSED
//!    ▲                 ▲  ▲                                        │
//!    │                 │  └────────────── RESUMING ◀──[resume]─────┘
//!    │                 │
//!    └──[power loss]── REPRINTED
//!
//!  Any state ──[stop]──▶ IDLE
//! ```

use log::{debug, info, warn};

use super::context::SessionContext;
use super::{PrintState, StateDescriptor};
use crate::app::events::SessionEvent;
use crate::app::machine::MachineCommand;
use crate::app::ports::{PreviewSource, PrinterPorts, Screen, SessionStore, StorageError};
use crate::checkpoint::{Axis, ParkingPlan, PositionCheckpoint};
use crate::error::{CommandError, Error};
use crate::sensors::RunoutPolicy;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table.  Called once per session.
pub fn build_state_table<IO: PrinterPorts>() -> [StateDescriptor<IO>; PrintState::COUNT] {
    [
        StateDescriptor {
            id: PrintState::Idle,
            name: "Idle",
            on_enter: None,
            on_exit: None,
            on_update: idle_update::<IO>,
        },
        StateDescriptor {
            id: PrintState::Working,
            name: "Working",
            on_enter: Some(working_enter::<IO>),
            on_exit: None,
            on_update: working_update::<IO>,
        },
        StateDescriptor {
            id: PrintState::Pausing,
            name: "Pausing",
            on_enter: Some(pausing_enter::<IO>),
            on_exit: None,
            on_update: pausing_update::<IO>,
        },
        StateDescriptor {
            id: PrintState::Paused,
            name: "Paused",
            on_enter: Some(paused_enter::<IO>),
            on_exit: None,
            on_update: paused_update::<IO>,
        },
        StateDescriptor {
            id: PrintState::Resuming,
            name: "Resuming",
            on_enter: None,
            on_exit: None,
            on_update: resuming_update::<IO>,
        },
        StateDescriptor {
            id: PrintState::Reprinted,
            name: "Reprinted",
            on_enter: None,
            on_exit: None,
            on_update: reprinted_update::<IO>,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update<IO: PrinterPorts>(
    ctx: &mut SessionContext,
    io: &mut IO,
) -> Result<Option<PrintState>, Error> {
    if ctx.leveling_requested {
        run_leveling(ctx, io)?;
    }
    Ok(None)
}

// ═══════════════════════════════════════════════════════════════════════════
//  WORKING state
// ═══════════════════════════════════════════════════════════════════════════

fn working_enter<IO: PrinterPorts>(_ctx: &mut SessionContext, io: &mut IO) {
    io.start_timer();
}

fn working_update<IO: PrinterPorts>(
    ctx: &mut SessionContext,
    io: &mut IO,
) -> Result<Option<PrintState>, Error> {
    if let Some(trigger) = ctx.detector.poll(&ctx.filament, ctx.now_ms) {
        warn!("filament run-out on sensor {}, pausing", trigger.sensor);
        freeze(io);
        io.set_preview(if ctx.config.preview_from_flash {
            PreviewSource::Flash
        } else {
            PreviewSource::Default
        });
        io.clear_screen();
        io.show(Screen::Printing);
        ctx.notify(SessionEvent::RunoutDetected {
            sensor: trigger.sensor,
        });
        if core::mem::take(&mut ctx.leveling_requested) {
            warn!("auto-leveling dropped by run-out");
            ctx.notify(SessionEvent::LevelingRejected {
                current: PrintState::Working,
            });
        }
        return Ok(Some(PrintState::Pausing));
    }

    if ctx.leveling_requested {
        run_leveling(ctx, io)?;
    }
    Ok(None)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PAUSING state
// ═══════════════════════════════════════════════════════════════════════════

fn pausing_enter<IO: PrinterPorts>(_ctx: &mut SessionContext, io: &mut IO) {
    io.clear_screen();
    io.show(Screen::PausingDialog);
}

/// Drain, capture, park, persist.
///
/// Any failure before the capture keeps the state so the whole step runs
/// again next tick.  Once the checkpoint is taken the transition proceeds
/// and later failures are only reported.
fn pausing_update<IO: PrinterPorts>(
    ctx: &mut SessionContext,
    io: &mut IO,
) -> Result<Option<PrintState>, Error> {
    drain_backlog(ctx.config.backlog_drain_limit, io)?;
    io.wait_for_idle(ctx.config.motion_drain_timeout_ms)?;
    let position = io.position();
    io.execute(&MachineCommand::PauseJob)?;

    let plan = ctx.config.parking();
    let checkpoint = PositionCheckpoint::for_pause(position, &plan);
    ctx.checkpoint = Some(checkpoint);
    ctx.notify(SessionEvent::CheckpointSaved(checkpoint));
    info!(
        "checkpoint X{:.2} Y{:.2} Z{:.2} E{:.2}",
        position.x, position.y, position.z, position.e
    );

    if let Err(e) = park_head(&plan, io) {
        ctx.raise(e);
    }

    ctx.pause_reprint = true;
    if let Err(e) = persist(ctx, io) {
        ctx.raise(e);
    }
    Ok(Some(PrintState::Paused))
}

// ═══════════════════════════════════════════════════════════════════════════
//  PAUSED state
// ═══════════════════════════════════════════════════════════════════════════

fn paused_enter<IO: PrinterPorts>(_ctx: &mut SessionContext, io: &mut IO) {
    io.clear_screen();
    io.show_previous();
}

fn paused_update<IO: PrinterPorts>(
    _ctx: &mut SessionContext,
    _io: &mut IO,
) -> Result<Option<PrintState>, Error> {
    Ok(None)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RESUMING state
// ═══════════════════════════════════════════════════════════════════════════

fn resuming_update<IO: PrinterPorts>(
    ctx: &mut SessionContext,
    io: &mut IO,
) -> Result<Option<PrintState>, Error> {
    if !io.is_paused() {
        debug!("resume held: transport not paused");
        return Ok(None);
    }

    if let Some(checkpoint) = ctx.checkpoint {
        // Absolute moves only, so a retry after a failure lands in the
        // same place.
        for (axis, mm) in checkpoint.restore_moves() {
            io.execute(&MachineCommand::Move { axis, mm })?;
        }
    } else {
        warn!("resuming without a checkpoint, head stays where it is");
    }
    io.execute(&MachineCommand::ResumeJob)?;

    ctx.consume_checkpoint();
    if let Err(e) = persist(ctx, io) {
        ctx.raise(e);
    }
    info!("print resumed");
    Ok(Some(PrintState::Working))
}

// ═══════════════════════════════════════════════════════════════════════════
//  REPRINTED state
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(feature = "power-loss-recovery")]
fn reprinted_update<IO: PrinterPorts>(
    ctx: &mut SessionContext,
    io: &mut IO,
) -> Result<Option<PrintState>, Error> {
    let reprint = crate::recovery::ReprintContext::fetch(&*io, ctx.pause_reprint);
    let heated = reprint.preheat(io)?;
    reprint.resume(io)?;
    info!("power-loss recovery resumed ({} heaters preheated)", heated);

    ctx.consume_checkpoint();
    if let Err(e) = persist(ctx, io) {
        ctx.raise(e);
    }
    Ok(Some(PrintState::Working))
}

#[cfg(not(feature = "power-loss-recovery"))]
fn reprinted_update<IO: PrinterPorts>(
    _ctx: &mut SessionContext,
    _io: &mut IO,
) -> Result<Option<PrintState>, Error> {
    warn!("power-loss recovery not compiled in");
    Ok(Some(PrintState::Idle))
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared steps
// ═══════════════════════════════════════════════════════════════════════════

/// Stop the job stream and the elapsed timer.
pub(crate) fn freeze<IO: PrinterPorts>(io: &mut IO) {
    io.pause_transfer();
    io.stop_timer();
}

/// Queue the leveling script once.  The flag is cleared first so a queue
/// failure does not replay the lines that already went out.
fn run_leveling<IO: PrinterPorts>(ctx: &mut SessionContext, io: &mut IO) -> Result<(), Error> {
    ctx.leveling_requested = false;
    for line in &ctx.config.leveling_commands {
        io.enqueue(&MachineCommand::Raw(line.clone()))?;
    }
    io.clear_screen();
    io.show(Screen::LevelingSettings);
    ctx.notify(SessionEvent::LevelingStarted);
    info!(
        "auto-leveling queued ({} lines)",
        ctx.config.leveling_commands.len()
    );
    Ok(())
}

fn drain_backlog<IO: PrinterPorts>(limit: u16, io: &mut IO) -> Result<(), Error> {
    let mut advanced = 0u16;
    while io.backlog_len() > 0 {
        if advanced >= limit {
            warn!(
                "backlog still holds {} commands after {} advances",
                io.backlog_len(),
                advanced
            );
            return Err(CommandError::BacklogStuck.into());
        }
        io.advance_backlog()?;
        advanced += 1;
    }
    Ok(())
}

/// Lift and park after a capture.  Always leaves the machine in absolute
/// positioning once relative mode was entered.
fn park_head<IO: PrinterPorts>(plan: &ParkingPlan, io: &mut IO) -> Result<(), Error> {
    if let Some(lift) = plan.lift_z {
        io.execute(&MachineCommand::RelativePositioning)?;
        let lifted = io.execute(&MachineCommand::Move {
            axis: Axis::Z,
            mm: lift,
        });
        io.execute(&MachineCommand::AbsolutePositioning)?;
        lifted?;
    }
    if let Some(x) = plan.park_x {
        io.execute(&MachineCommand::Move { axis: Axis::X, mm: x })?;
    }
    if let Some(y) = plan.park_y {
        io.execute(&MachineCommand::Move { axis: Axis::Y, mm: y })?;
    }
    Ok(())
}

/// Write the session record, retrying up to `persist_attempts` times.
///
/// On exhaustion the record is marked pending; the session retries it
/// once per tick until a write succeeds.
pub(crate) fn persist<S: SessionStore + ?Sized>(
    ctx: &mut SessionContext,
    store: &mut S,
) -> Result<(), Error> {
    let record = ctx.session_record();
    let attempts = ctx.config.persist_attempts.max(1);
    let mut last = StorageError::IoError;
    for attempt in 1..=attempts {
        match store.save_session(&record) {
            Ok(()) => {
                ctx.persist_pending = false;
                return Ok(());
            }
            Err(e) => {
                warn!("session save attempt {}/{} failed: {}", attempt, attempts, e);
                last = e;
            }
        }
    }
    ctx.persist_pending = true;
    Err(Error::Storage(last))
}
