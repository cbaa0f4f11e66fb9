//! Application core: pure session logic, zero I/O.
//!
//! This module contains the orchestration rules of the print-session
//! controller: request handling, FSM driving and persistence policy.
//! All interaction with the printer happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real hardware.

pub mod commands;
pub mod events;
pub mod machine;
pub mod ports;
pub mod service;
