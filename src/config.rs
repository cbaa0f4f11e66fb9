//! Controller configuration parameters
//!
//! All tunable parameters consumed by the print-session controller.
//! Values can be overridden from persistent storage or, on the host
//! simulator, from a JSON file.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::checkpoint::{ParkingPlan, axis_setting};

/// Maximum number of lines in the auto-leveling script.
pub const MAX_LEVELING_COMMANDS: usize = 4;
/// Maximum length of a single leveling script line.
pub const LEVELING_LINE_LEN: usize = 32;

/// One line of the auto-leveling script.
pub type ScriptLine = String<LEVELING_LINE_LEN>;

/// Which debounce policy the filament monitor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunoutStrategy {
    /// Saturating counter, two samples per poll.
    Counter,
    /// Five-phase timed state machine.
    Timed,
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Filament monitor ---
    /// Debounce strategy
    pub runout_strategy: RunoutStrategy,
    /// Counter strategy: trigger value (counter ticks)
    pub runout_threshold: u16,
    /// Timed strategy: absence must persist this long (milliseconds)
    pub runout_delay_ms: u32,
    /// Sensor active level is inverted (high = filament absent)
    pub runout_inverting: bool,

    // --- Pause parking (-1 disables an axis) ---
    /// Relative Z lift applied after the checkpoint is captured (mm)
    pub pause_lift_z_mm: f32,
    /// Absolute X park position (mm)
    pub pause_park_x_mm: f32,
    /// Absolute Y park position (mm)
    pub pause_park_y_mm: f32,

    // --- Pause sequencing bounds ---
    /// Upper bound on the motion drain wait (milliseconds)
    pub motion_drain_timeout_ms: u32,
    /// Upper bound on backlog advances during one pause
    pub backlog_drain_limit: u16,
    /// Immediate save attempts before persistence is deferred to the next tick
    pub persist_attempts: u8,

    // --- UI ---
    /// Show the preview image from flash (otherwise the default image)
    pub preview_from_flash: bool,

    // --- Auto-leveling ---
    /// Script enqueued when auto-leveling is requested
    pub leveling_commands: Vec<ScriptLine, MAX_LEVELING_COMMANDS>,

    // --- Timing ---
    /// Scheduler tick period (milliseconds)
    pub tick_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut leveling_commands = Vec::new();
        for text in ["G28", "G29"] {
            if let Some(line) = script_line(text) {
                let _ = leveling_commands.push(line);
            }
        }

        Self {
            // Filament monitor
            runout_strategy: RunoutStrategy::Counter,
            runout_threshold: 20,
            runout_delay_ms: 1500,
            runout_inverting: false,

            // Parking
            pause_lift_z_mm: 5.0,
            pause_park_x_mm: -1.0,
            pause_park_y_mm: -1.0,

            // Bounds
            motion_drain_timeout_ms: 60_000,
            backlog_drain_limit: 64,
            persist_attempts: 3,

            // UI
            preview_from_flash: false,

            leveling_commands,

            // Timing
            tick_interval_ms: 50, // 20 Hz
        }
    }
}

/// Build a script line, `None` if `text` does not fit.
pub fn script_line(text: &str) -> Option<ScriptLine> {
    let mut line = ScriptLine::new();
    line.push_str(text).ok()?;
    Some(line)
}

impl SystemConfig {
    /// Parking moves derived from the sentinel-encoded pause fields.
    pub fn parking(&self) -> ParkingPlan {
        ParkingPlan {
            lift_z: axis_setting(self.pause_lift_z_mm),
            park_x: axis_setting(self.pause_park_x_mm),
            park_y: axis_setting(self.pause_park_y_mm),
        }
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.runout_threshold) {
            return Err(ConfigError::ValidationFailed(
                "runout_threshold must be 1-1000",
            ));
        }
        if self.runout_delay_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "runout_delay_ms must be 0-60000",
            ));
        }
        let plan = self.parking();
        if plan.lift_z.is_some_and(|z| !(0.0..=100.0).contains(&z)) {
            return Err(ConfigError::ValidationFailed(
                "pause_lift_z_mm must be -1 or 0-100",
            ));
        }
        if plan.park_x.is_some_and(|x| !(0.0..=1000.0).contains(&x)) {
            return Err(ConfigError::ValidationFailed(
                "pause_park_x_mm must be -1 or 0-1000",
            ));
        }
        if plan.park_y.is_some_and(|y| !(0.0..=1000.0).contains(&y)) {
            return Err(ConfigError::ValidationFailed(
                "pause_park_y_mm must be -1 or 0-1000",
            ));
        }
        if !(100..=600_000).contains(&self.motion_drain_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "motion_drain_timeout_ms must be 100-600000",
            ));
        }
        if self.backlog_drain_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "backlog_drain_limit must be at least 1",
            ));
        }
        if !(1..=10).contains(&self.persist_attempts) {
            return Err(ConfigError::ValidationFailed(
                "persist_attempts must be 1-10",
            ));
        }
        if !(5..=1000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "tick_interval_ms must be 5-1000",
            ));
        }
        Ok(())
    }
}
