//! Filament monitor: presence sensors and the run-out debounce.
//!
//! A [`SensorBank`] owns up to three presence switches and produces a
//! [`FilamentSnapshot`] each tick.  A [`FilamentDetector`] turns successive
//! snapshots into at most one [`RunoutTrigger`] per poll using one of two
//! debounce strategies:
//!
//! - [`runout_counter`]: saturating counter, rule applied twice per poll
//! - [`runout_timer`]: five-phase timed state machine
//!
//! ## Dual-target design
//!
//! Pins are `embedded_hal::digital::InputPin`, so firmware passes HAL pins
//! configured with pull-ups and the host simulator passes
//! [`SimPin`](crate::adapters::sim::SimPin).

pub mod runout_counter;
pub mod runout_timer;

use embedded_hal::digital::InputPin;
use heapless::Vec;
use log::warn;

use crate::config::{RunoutStrategy, SystemConfig};
use crate::error::SensorError;
use runout_counter::CounterDetector;
use runout_timer::TimedDetector;

/// Maximum number of filament presence sensors (one per extruder).
pub const MAX_FILAMENT_SENSORS: usize = 3;

// ---------------------------------------------------------------------------
// Single sensor
// ---------------------------------------------------------------------------

/// One presence switch plus its active-level inversion.
pub struct FilamentSensor<P> {
    pin: P,
    inverting: bool,
}

impl<P: InputPin> FilamentSensor<P> {
    pub fn new(pin: P, inverting: bool) -> Self {
        Self { pin, inverting }
    }

    /// `true` when this sensor reports run-out.
    ///
    /// Run-out is the pin level matching `inverting`: low for a normal
    /// switch, high for an inverted one.
    pub fn read_runout(&mut self) -> Result<bool, P::Error> {
        Ok(self.pin.is_high()? == self.inverting)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Per-sensor run-out flags for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilamentSnapshot {
    pub runout: [bool; MAX_FILAMENT_SENSORS],
    /// Number of configured sensors (`runout[count..]` is always false).
    pub count: usize,
}

impl FilamentSnapshot {
    /// Logical AND of presence across every configured sensor.  An empty
    /// bank is always present.
    pub fn all_present(&self) -> bool {
        self.first_absent().is_none()
    }

    /// `count` is clamped to [`MAX_FILAMENT_SENSORS`].
    pub fn first_absent(&self) -> Option<usize> {
        self.runout[..self.count.min(MAX_FILAMENT_SENSORS)]
            .iter()
            .position(|&absent| absent)
    }

    /// Build a snapshot directly from flags (tests, simulators).
    pub fn from_flags(flags: &[bool]) -> Self {
        let mut snap = Self::default();
        for (slot, &absent) in snap.runout.iter_mut().zip(flags) {
            *slot = absent;
            snap.count += 1;
        }
        snap
    }
}

// ---------------------------------------------------------------------------
// Bank
// ---------------------------------------------------------------------------

/// The set of configured sensors.  Sensors that are not fitted are simply
/// not pushed.
pub struct SensorBank<P> {
    sensors: Vec<FilamentSensor<P>, MAX_FILAMENT_SENSORS>,
}

impl<P: InputPin> SensorBank<P> {
    pub fn empty() -> Self {
        Self {
            sensors: Vec::new(),
        }
    }

    /// Build a bank from pins sharing one inversion setting.  Extra pins
    /// beyond [`MAX_FILAMENT_SENSORS`] are ignored with a warning.
    pub fn from_pins(pins: impl IntoIterator<Item = P>, inverting: bool) -> Self {
        let mut bank = Self::empty();
        for pin in pins {
            if bank.add(FilamentSensor::new(pin, inverting)).is_err() {
                warn!("more than {} filament sensors, extra ignored", MAX_FILAMENT_SENSORS);
                break;
            }
        }
        bank
    }

    pub fn add(&mut self, sensor: FilamentSensor<P>) -> Result<(), FilamentSensor<P>> {
        self.sensors.push(sensor)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Read each pin once.
    ///
    /// A failed read is logged and counted as filament present, so a
    /// flaky line can lose coverage but never stops a print on its own.
    pub fn sample(&mut self) -> FilamentSnapshot {
        let mut snap = FilamentSnapshot {
            count: self.sensors.len(),
            ..FilamentSnapshot::default()
        };
        for (idx, sensor) in self.sensors.iter_mut().enumerate() {
            snap.runout[idx] = match sensor.read_runout() {
                Ok(absent) => absent,
                Err(_) => {
                    warn!("{}", SensorError::GpioReadFailed { sensor: idx });
                    false
                }
            };
        }
        snap
    }
}

// ---------------------------------------------------------------------------
// Debounce interface
// ---------------------------------------------------------------------------

/// Debounced run-out for `sensor` (the first one that crossed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunoutTrigger {
    pub sensor: usize,
}

/// A debounce policy over successive snapshots.
pub trait RunoutPolicy {
    /// Feed one sample.  Returns at most one trigger per call.
    fn poll(&mut self, snapshot: &FilamentSnapshot, now_ms: u32) -> Option<RunoutTrigger>;

    /// Forget accumulated evidence (operator refilled the spool).
    fn rearm(&mut self);
}

/// The configured strategy.  An enum rather than `dyn` so the session
/// stays allocation-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilamentDetector {
    Counter(CounterDetector),
    Timed(TimedDetector),
}

impl FilamentDetector {
    pub fn from_config(config: &SystemConfig) -> Self {
        match config.runout_strategy {
            RunoutStrategy::Counter => Self::Counter(CounterDetector::new(config.runout_threshold)),
            RunoutStrategy::Timed => Self::Timed(TimedDetector::new(config.runout_delay_ms)),
        }
    }

    pub fn strategy(&self) -> RunoutStrategy {
        match self {
            Self::Counter(_) => RunoutStrategy::Counter,
            Self::Timed(_) => RunoutStrategy::Timed,
        }
    }
}

impl RunoutPolicy for FilamentDetector {
    fn poll(&mut self, snapshot: &FilamentSnapshot, now_ms: u32) -> Option<RunoutTrigger> {
        match self {
            Self::Counter(d) => d.poll(snapshot, now_ms),
            Self::Timed(d) => d.poll(snapshot, now_ms),
        }
    }

    fn rearm(&mut self) {
        match self {
            Self::Counter(d) => d.rearm(),
            Self::Timed(d) => d.rearm(),
        }
    }
}
