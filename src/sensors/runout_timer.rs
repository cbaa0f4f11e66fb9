//! Timed debounce: absence must persist for `tick_delay` milliseconds.
//!
//! ```text
//!  CHECK ──[absent]──▶ WAIT ──[absent, elapsed >= delay]──▶ RUN
//!    ▲                  │                                    │
//!    │              [present]                          [next poll: fire]
//!    │                  ▼                                    ▼
//!    └───────────────  END  ◀────────[present]─────────── WAIT_UP
//! ```
//!
//! Elapsed time uses wrapping subtraction so the millisecond clock may
//! roll over.

use super::{FilamentSnapshot, RunoutPolicy, RunoutTrigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Check,
    Wait,
    Run,
    WaitUp,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedDetector {
    phase: TimerPhase,
    tick_start: u32,
    tick_end: u32,
    tick_delay: u32,
    /// Sensor that opened the current absence window.
    first_absent: usize,
}

impl TimedDetector {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            phase: TimerPhase::Check,
            tick_start: 0,
            tick_end: 0,
            tick_delay: delay_ms,
            first_absent: 0,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    fn reset_timers(&mut self) {
        self.tick_start = 0;
        self.tick_end = 0;
    }
}

impl RunoutPolicy for TimedDetector {
    fn poll(&mut self, snapshot: &FilamentSnapshot, now_ms: u32) -> Option<RunoutTrigger> {
        match self.phase {
            TimerPhase::Check => {
                if let Some(sensor) = snapshot.first_absent() {
                    self.phase = TimerPhase::Wait;
                    self.tick_start = now_ms;
                    self.first_absent = sensor;
                }
                None
            }
            TimerPhase::Wait => {
                self.tick_end = now_ms;
                if snapshot.all_present() {
                    self.phase = TimerPhase::End;
                } else if self.tick_end.wrapping_sub(self.tick_start) >= self.tick_delay {
                    self.phase = TimerPhase::Run;
                }
                None
            }
            TimerPhase::Run => {
                self.phase = TimerPhase::WaitUp;
                Some(RunoutTrigger {
                    sensor: self.first_absent,
                })
            }
            TimerPhase::WaitUp => {
                if snapshot.all_present() {
                    self.phase = TimerPhase::End;
                }
                None
            }
            TimerPhase::End => {
                self.reset_timers();
                self.phase = TimerPhase::Check;
                None
            }
        }
    }

    fn rearm(&mut self) {
        self.reset_timers();
        self.phase = TimerPhase::Check;
    }
}
