//! Integration test driver for the `tests/integration/` suite.
//!
//! Each `mod` below exercises the print session against the
//! call-recording mock printer.  Everything runs on the host; no
//! hardware is required.

mod mock_printer;
#[cfg(feature = "power-loss-recovery")]
mod recovery_tests;
