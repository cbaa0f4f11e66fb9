//! Transition request handoff.
//!
//! The touch UI, the host serial link and the power-loss dialog run
//! outside the session tick.  They never write the session state; they
//! post a request here and the tick consumes it at its start.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────┐     ┌────────────────┐
//! │ UI / host   │────▶│  next: Signal<State> │────▶│                │
//! │ Power-loss  │────▶│  leveling: AtomicBool│────▶│  session tick  │
//! │ Refill btn  │────▶│  rearm: AtomicBool   │────▶│  (consumer)    │
//! └─────────────┘     └──────────────────────┘     └────────────────┘
//! ```
//!
//! The state slot holds one value: a newer request overwrites an older
//! unconsumed one.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::fsm::PrintState;

pub struct TransitionRequests {
    next: Signal<CriticalSectionRawMutex, PrintState>,
    leveling: AtomicBool,
    rearm_runout: AtomicBool,
}

impl TransitionRequests {
    pub const fn new() -> Self {
        Self {
            next: Signal::new(),
            leveling: AtomicBool::new(false),
            rearm_runout: AtomicBool::new(false),
        }
    }

    /// Post a requested state.  Latest wins.
    pub fn request(&self, state: PrintState) {
        self.next.signal(state);
    }

    /// Take the pending request, if any.
    pub fn take(&self) -> Option<PrintState> {
        self.next.try_take()
    }

    pub fn pending(&self) -> bool {
        self.next.signaled()
    }

    /// Arm a one-shot auto-leveling run.
    pub fn arm_leveling(&self) {
        self.leveling.store(true, Ordering::Release);
    }

    pub fn take_leveling(&self) -> bool {
        self.leveling.swap(false, Ordering::AcqRel)
    }

    pub fn rearm_runout(&self) {
        self.rearm_runout.store(true, Ordering::Release);
    }

    pub fn take_rearm(&self) -> bool {
        self.rearm_runout.swap(false, Ordering::AcqRel)
    }
}

impl Default for TransitionRequests {
    fn default() -> Self {
        Self::new()
    }
}
