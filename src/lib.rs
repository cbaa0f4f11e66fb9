//! Print-session lifecycle controller.
//!
//! Decides when an active print must be interrupted (operator pause,
//! filament run-out, power loss), checkpoints the head position across the
//! interruption and sequences the resume.  Everything outside that core
//! (G-code execution, motion, SD streaming, screens, storage media) is
//! reached through the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod app;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod fsm;
#[cfg(feature = "power-loss-recovery")]
pub mod recovery;
pub mod requests;
pub mod sensors;

pub mod adapters;

pub use app::service::PrintSession;
pub use error::{Error, Result};
pub use fsm::PrintState;
