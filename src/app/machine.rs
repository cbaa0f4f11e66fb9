//! Typed machine commands handed to the command executor.
//!
//! Every command renders to a single G-code line through [`Display`], so
//! an executor backed by a text queue can format straight into its buffer.

use core::fmt;

use crate::checkpoint::Axis;
use crate::config::ScriptLine;

#[derive(Debug, Clone, PartialEq)]
pub enum MachineCommand {
    /// `M25`: pause the job stream.
    PauseJob,
    /// `M24`: start or resume the job stream.
    ResumeJob,
    /// `G91`
    RelativePositioning,
    /// `G90`
    AbsolutePositioning,
    /// `G1` on a single axis.  Interpreted in the current positioning mode.
    Move { axis: Axis, mm: f32 },
    /// `T<n>`
    SelectTool(u8),
    /// `M109 S<t>`: set hotend target and wait for it.
    HeatAndWait { celsius: i16 },
    /// Verbatim line from a configured script.
    Raw(ScriptLine),
}

impl fmt::Display for MachineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PauseJob => write!(f, "M25"),
            Self::ResumeJob => write!(f, "M24"),
            Self::RelativePositioning => write!(f, "G91"),
            Self::AbsolutePositioning => write!(f, "G90"),
            Self::Move { axis, mm } => write!(f, "G1 {}{:.2}", axis.letter(), mm),
            Self::SelectTool(tool) => write!(f, "T{tool}"),
            Self::HeatAndWait { celsius } => write!(f, "M109 S{celsius}"),
            Self::Raw(line) => f.write_str(line.as_str()),
        }
    }
}
