//! Bridge to the power-loss recovery subsystem.
//!
//! When a print was interrupted by a power failure the recovery
//! subsystem holds the per-heater targets, the active tool and the job
//! position.  This module reads what the reprint sequence needs, brings
//! the hotends back to temperature and hands control back to the
//! subsystem's own resume.
//!
//! The head is not re-positioned here.  Recovery's resume restores the
//! job position itself.

use heapless::Vec;
use log::{info, warn};

use crate::app::machine::MachineCommand;
use crate::app::ports::{CommandPort, RecoveryPort};
use crate::error::Error;

/// Upper bound on heaters tracked by the recovery record.
pub const MAX_HEATERS: usize = 8;

/// Snapshot of the recovery record taken when `Reprinted` runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReprintContext {
    /// Target per heater, `0` = was off.
    pub targets: Vec<i16, MAX_HEATERS>,
    pub active_tool: u8,
    /// The job was paused when power failed.
    pub pause_reprint: bool,
}

impl ReprintContext {
    pub fn fetch(recovery: &impl RecoveryPort, pause_reprint: bool) -> Self {
        let heaters = recovery.heater_count();
        if usize::from(heaters) > MAX_HEATERS {
            warn!(
                "recovery reports {} heaters, only {} tracked",
                heaters, MAX_HEATERS
            );
        }
        let targets = (0..heaters)
            .take(MAX_HEATERS)
            .map(|h| recovery.target_temperature(h))
            .collect();
        Self {
            targets,
            active_tool: recovery.active_tool(),
            pause_reprint,
        }
    }

    pub fn multi_tool(&self) -> bool {
        self.targets.len() > 1
    }

    /// Heat every hotend that had a target and wait for each.  Returns the
    /// number of heaters brought up.
    pub fn preheat(&self, commands: &mut impl CommandPort) -> Result<usize, Error> {
        let mut heated = 0;
        for (tool, &celsius) in self.targets.iter().enumerate() {
            if celsius == 0 {
                continue;
            }
            if self.multi_tool() {
                commands.execute(&MachineCommand::SelectTool(tool as u8))?;
            }
            info!("preheating tool {} to {} C", tool, celsius);
            commands.execute(&MachineCommand::HeatAndWait { celsius })?;
            heated += 1;
        }
        Ok(heated)
    }

    /// Hand over to the recovery subsystem's full-state resume.
    pub fn resume(&self, recovery: &mut impl RecoveryPort) -> Result<(), Error> {
        info!(
            "resuming recorded job (tool {}, paused before power loss: {})",
            self.active_tool, self.pause_reprint
        );
        recovery.resume().map_err(Error::from)
    }
}
