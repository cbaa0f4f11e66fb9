//! Counter debounce.
//!
//! Each poll applies the decision rule twice to the same reading:
//! increment on absence, decrement on presence, clamped to
//! `[0, threshold]`.  A run-out fires while any counter sits at the
//! threshold, so continuous absence from zero fires on poll
//! `ceil(threshold / 2)`.

use super::{FilamentSnapshot, MAX_FILAMENT_SENSORS, RunoutPolicy, RunoutTrigger};

/// Applications of the rule per poll.
const STEPS_PER_POLL: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDetector {
    threshold: u16,
    counts: [u16; MAX_FILAMENT_SENSORS],
}

impl CounterDetector {
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold: threshold.max(1),
            counts: [0; MAX_FILAMENT_SENSORS],
        }
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    pub fn count(&self, sensor: usize) -> u16 {
        self.counts.get(sensor).copied().unwrap_or(0)
    }
}

impl RunoutPolicy for CounterDetector {
    fn poll(&mut self, snapshot: &FilamentSnapshot, _now_ms: u32) -> Option<RunoutTrigger> {
        let sensors = snapshot.count.min(MAX_FILAMENT_SENSORS);
        for (count, &absent) in self.counts[..sensors].iter_mut().zip(&snapshot.runout) {
            for _ in 0..STEPS_PER_POLL {
                *count = if absent {
                    count.saturating_add(1).min(self.threshold)
                } else {
                    count.saturating_sub(1)
                };
            }
        }

        self.counts[..sensors]
            .iter()
            .position(|&c| c >= self.threshold)
            .map(|sensor| RunoutTrigger { sensor })
    }

    fn rearm(&mut self) {
        self.counts = [0; MAX_FILAMENT_SENSORS];
    }
}
