//! Port traits: the hexagonal boundary between the session controller and
//! the rest of the firmware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PrintSession (domain)
//! ```
//!
//! Driven adapters (command executor, motion planner, SD transport, screen,
//! storage, power-loss recovery) implement these traits.  The
//! [`PrintSession`](super::service::PrintSession) consumes them via
//! generics, so the domain core never reaches into global printer state.
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed and `Copy`.

use crate::app::events::SessionEvent;
use crate::app::machine::MachineCommand;
use crate::checkpoint::{Position, SessionRecord};
use crate::config::SystemConfig;
use crate::error::{CommandError, MotionError, RecoveryError};

// ───────────────────────────────────────────────────────────────
// Command executor (domain → G-code queue)
// ───────────────────────────────────────────────────────────────

pub trait CommandPort {
    /// Run one command to completion before returning.
    fn execute(&mut self, command: &MachineCommand) -> Result<(), CommandError>;

    /// Append a command to the asynchronous queue.
    fn enqueue(&mut self, command: &MachineCommand) -> Result<(), CommandError>;

    /// Number of commands buffered but not yet handed to the planner.
    fn backlog_len(&self) -> usize;

    /// Hand the next buffered command to the planner.
    fn advance_backlog(&mut self) -> Result<(), CommandError>;
}

// ───────────────────────────────────────────────────────────────
// Motion pipeline
// ───────────────────────────────────────────────────────────────

pub trait MotionPort {
    /// Block until all queued motion has executed, at most `timeout_ms`.
    fn wait_for_idle(&mut self, timeout_ms: u32) -> Result<(), MotionError>;

    /// Current machine position.  Only meaningful after a drain.
    fn position(&self) -> Position;
}

// ───────────────────────────────────────────────────────────────
// Print transport (SD / host streaming)
// ───────────────────────────────────────────────────────────────

/// The job streaming layer.  Resuming goes through `M24`, so there is no
/// resume operation here.
pub trait TransportPort {
    /// Stop feeding the job to the command queue.
    fn pause_transfer(&mut self);

    /// The transport itself reports a paused job.
    fn is_paused(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Elapsed print timer
// ───────────────────────────────────────────────────────────────

pub trait PrintTimerPort {
    fn start_timer(&mut self);
    fn stop_timer(&mut self);
}

// ───────────────────────────────────────────────────────────────
// UI layer
// ───────────────────────────────────────────────────────────────

/// Screens the controller asks the UI to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Modal shown while the pause sequence runs.
    PausingDialog,
    /// The printing status screen.
    Printing,
    /// Bed-leveling settings page.
    LevelingSettings,
}

/// Source of the job preview image on the printing screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    Flash,
    Default,
}

pub trait UiPort {
    fn clear_screen(&mut self);
    fn show(&mut self, screen: Screen);
    /// Return to whatever screen was active before the last dialog.
    fn show_previous(&mut self);
    fn set_preview(&mut self, source: PreviewSource);
}

// ───────────────────────────────────────────────────────────────
// Session persistence
// ───────────────────────────────────────────────────────────────

/// Durable storage of the pause flag and checkpoint.
pub trait SessionStore {
    /// `Ok(None)` on first boot.
    fn load_session(&self) -> Result<Option<SessionRecord>, StorageError>;

    /// Write the record atomically.
    fn save_session(&mut self, record: &SessionRecord) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Power-loss recovery subsystem
// ───────────────────────────────────────────────────────────────

pub trait RecoveryPort {
    /// Number of heaters with a recorded target.
    fn heater_count(&self) -> u8;

    /// Last recorded target for `heater` (°C, 0 = off).
    fn target_temperature(&self, heater: u8) -> i16;

    /// Tool that was active when power was lost.
    fn active_tool(&self) -> u8;

    /// Replay the recorded job state (file offset, fan, feedrate, ...).
    fn resume(&mut self) -> Result<(), RecoveryError>;
}

// ───────────────────────────────────────────────────────────────
// Aggregate collaborator bundle
// ───────────────────────────────────────────────────────────────

/// Everything a state handler may touch, passed as one `&mut IO`.
pub trait PrinterPorts:
    CommandPort + MotionPort + TransportPort + PrintTimerPort + UiPort + SessionStore + RecoveryPort
{
}

impl<T> PrinterPorts for T where
    T: CommandPort
        + MotionPort
        + TransportPort
        + PrintTimerPort
        + UiPort
        + SessionStore
        + RecoveryPort
{
}

// ───────────────────────────────────────────────────────────────
// Event sink (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`SessionEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &SessionEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (key/value backend)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage (EEPROM emulation, flash, SD file).
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    StorageFull,
    IoError,
}

/// Errors from [`StoragePort`] and [`SessionStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
    /// Stored blob did not decode.
    Corrupted,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "record corrupted"),
        }
    }
}
