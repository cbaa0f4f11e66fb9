//! printctl host simulator.
//!
//! Drives one [`PrintSession`] against the simulated printer through a
//! scripted job: start, filament run-out, refill and resume, operator
//! pause, power loss and reprint.
//!
//! ```text
//! printctl-sim [config.json]
//! ```

use std::env;
use std::fs;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use printctl::PrintSession;
use printctl::adapters::log_sink::LogEventSink;
use printctl::adapters::sim::{SimPin, SimPrinter};
use printctl::adapters::storage::{KvStore, MemoryStorage};
use printctl::app::commands::SessionCommand;
use printctl::app::ports::ConfigPort;
use printctl::checkpoint::Position;
use printctl::config::SystemConfig;
use printctl::fsm::PrintState;
use printctl::requests::TransitionRequests;
use printctl::sensors::SensorBank;

/// Upper bound on ticks spent waiting for any one state.
const MAX_WAIT_TICKS: u32 = 500;

struct Clock {
    now_ms: u32,
    step_ms: u32,
}

impl Clock {
    fn advance(&mut self) -> u32 {
        self.now_ms = self.now_ms.wrapping_add(self.step_ms);
        self.now_ms
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    info!("printctl simulator v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let config = match env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path))?;
            let cfg: SystemConfig = serde_json::from_str(&text)
                .with_context(|| format!("parsing config file {}", path))?;
            info!("Loaded config from {}", path);
            cfg
        }
        None => SystemConfig::default(),
    };

    let mut kv = KvStore::new(MemoryStorage::new());
    kv.save(&config)
        .map_err(|e| anyhow::anyhow!("config rejected: {}", e))?;
    let config = kv
        .load()
        .map_err(|e| anyhow::anyhow!("config reload failed: {}", e))?;
    info!(
        "Runout strategy {:?}, tick {} ms",
        config.runout_strategy, config.tick_interval_ms
    );

    // ── 2. Hardware ───────────────────────────────────────────
    // Filament present reads high unless the sensor is inverted.
    let present_level = !config.runout_inverting;
    let pin = SimPin::new(present_level);
    let mut printer = SimPrinter::new();
    printer.set_position(Position {
        x: 120.0,
        y: 95.5,
        z: 14.2,
        e: 812.0,
    });
    printer.set_recovery_targets(&[215]);

    let mut clock = Clock {
        now_ms: 0,
        step_ms: config.tick_interval_ms,
    };
    let mut sink = LogEventSink::new();

    // ── 3. Normal job with a run-out ──────────────────────────
    let requests = TransitionRequests::new();
    {
        let bank = SensorBank::from_pins([pin.clone()], config.runout_inverting);
        let mut session = PrintSession::new(config.clone(), bank, &requests);
        session
            .restore(&printer)
            .map_err(|e| anyhow::anyhow!("restore failed: {}", e))?;
        session.start(&mut printer, &mut sink);

        session
            .handle_command(SessionCommand::Start)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        run_until(&mut session, &mut printer, &mut sink, &mut clock, PrintState::Working)?;
        printer.push_backlog(6);

        info!("── filament runs out ──");
        pin.set_level(!present_level);
        run_until(&mut session, &mut printer, &mut sink, &mut clock, PrintState::Paused)?;
        info!("Paused with status {:?}", session.status());

        info!("── operator refills and resumes ──");
        pin.set_level(present_level);
        session
            .handle_command(SessionCommand::RearmRunout)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        session
            .handle_command(SessionCommand::Resume)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        run_until(&mut session, &mut printer, &mut sink, &mut clock, PrintState::Working)?;

        info!("── operator pause, then power fails ──");
        session
            .handle_command(SessionCommand::Pause)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        run_until(&mut session, &mut printer, &mut sink, &mut clock, PrintState::Paused)?;
    }

    // ── 4. Power cycle and reprint ────────────────────────────
    let mut printer = printer.power_cycle();
    let bank = SensorBank::from_pins([pin.clone()], config.runout_inverting);
    let mut session = PrintSession::new(config.clone(), bank, &requests);
    session
        .restore(&printer)
        .map_err(|e| anyhow::anyhow!("restore failed: {}", e))?;
    session.start(&mut printer, &mut sink);
    info!("After power cycle: {:?}", session.status());

    session
        .handle_command(SessionCommand::Reprint)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    run_until(&mut session, &mut printer, &mut sink, &mut clock, PrintState::Working)?;

    session
        .handle_command(SessionCommand::Stop)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    run_until(&mut session, &mut printer, &mut sink, &mut clock, PrintState::Idle)?;

    info!("Commands issued after power cycle:");
    for cmd in printer.executed() {
        info!("  {}", cmd);
    }
    info!("Simulation complete");
    Ok(())
}

fn run_until(
    session: &mut PrintSession<'_, SimPin, SimPrinter>,
    printer: &mut SimPrinter,
    sink: &mut LogEventSink,
    clock: &mut Clock,
    target: PrintState,
) -> Result<()> {
    for _ in 0..MAX_WAIT_TICKS {
        if let Err(e) = session.tick(clock.advance(), printer, sink) {
            warn!("tick error: {}", e);
        }
        if session.state() == target {
            return Ok(());
        }
    }
    bail!(
        "state {} not reached within {} ticks (still {})",
        target,
        MAX_WAIT_TICKS,
        session.state()
    )
}
