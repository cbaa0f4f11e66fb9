//! Position checkpoint store.
//!
//! Passive record of where the head was when a pause began, plus the
//! parking moves applied on top of it.  The controller captures a
//! checkpoint while entering `Paused` and consumes it while leaving
//! `Paused` (via `Resuming`) or `Reprinted`.
//!
//! Configuration encodes "do not move this axis" with the sentinel `-1`;
//! inside the crate that sentinel becomes `None`.

use serde::{Deserialize, Serialize};

/// Sentinel used by the configuration surface for a disabled axis.
pub const AXIS_DISABLED: f32 = -1.0;

/// Decode a sentinel-encoded axis setting.
pub fn axis_setting(value: f32) -> Option<f32> {
    if (value - AXIS_DISABLED).abs() < f32::EPSILON {
        None
    } else {
        Some(value)
    }
}

/// Encode an optional axis value back into the sentinel form.
pub fn axis_sentinel(value: Option<f32>) -> f32 {
    value.unwrap_or(AXIS_DISABLED)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    /// G-code axis letter.
    pub const fn letter(self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
            Self::E => 'E',
        }
    }
}

/// Machine position as reported by the motion pipeline (mm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub e: f32,
}

/// Parking moves applied after the checkpoint is captured.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParkingPlan {
    /// Relative upward Z move.
    pub lift_z: Option<f32>,
    /// Absolute X park coordinate.
    pub park_x: Option<f32>,
    /// Absolute Y park coordinate.
    pub park_y: Option<f32>,
}

/// Backed-up coordinates.  `None` means the axis is not restored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionCheckpoint {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
    pub e: Option<f32>,
}

impl PositionCheckpoint {
    /// Snapshot every axis of `pos`.
    pub fn capture(pos: Position) -> Self {
        Self {
            x: Some(pos.x),
            y: Some(pos.y),
            z: Some(pos.z),
            e: Some(pos.e),
        }
    }

    /// Snapshot taken when a pause parks the head by `plan`.
    ///
    /// An axis the plan leaves alone is not recorded, so resume only moves
    /// the axes that pausing moved.  X follows `park_x`, Y `park_y` and Z
    /// `lift_z`.  E is always recorded.
    pub fn for_pause(pos: Position, plan: &ParkingPlan) -> Self {
        Self {
            x: plan.park_x.map(|_| pos.x),
            y: plan.park_y.map(|_| pos.y),
            z: plan.lift_z.map(|_| pos.z),
            e: Some(pos.e),
        }
    }

    /// Build from sentinel-encoded values (e.g. a recovery record).
    pub fn from_sentinels(x: f32, y: f32, z: f32, e: f32) -> Self {
        Self {
            x: axis_setting(x),
            y: axis_setting(y),
            z: axis_setting(z),
            e: axis_setting(e),
        }
    }

    pub fn axis(&self, axis: Axis) -> Option<f32> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::E => self.e,
        }
    }

    /// Restore moves in issue order: X, then Y, then Z last.
    ///
    /// Z goes last so the head travels at the lifted height and only drops
    /// onto the part once it is above the captured XY.
    pub fn restore_moves(&self) -> impl Iterator<Item = (Axis, f32)> + '_ {
        [Axis::X, Axis::Y, Axis::Z]
            .into_iter()
            .filter_map(|axis| self.axis(axis).map(|mm| (axis, mm)))
    }
}

/// What is written to durable storage on every pause/resume edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The print was paused when this record was written.
    pub pause_reprint: bool,
    /// Position captured on the last pause, if still unconsumed.
    pub checkpoint: Option<PositionCheckpoint>,
}
