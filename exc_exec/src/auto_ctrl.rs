//! # Autonomous controller interface
//!
//! The autonomous controller produces its own joint commands from the operator command and the
//! measured joint positions. Only the interface lives here, the rig does not yet have a
//! controller, so the executable runs with [`NullController`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::exc::NUM_JOINTS;
use serde::Serialize;

use crate::js_cmd::CmdVector;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An autonomous joint controller.
pub trait Controller {
    /// Compute the controller's command for this cycle.
    ///
    /// ## Arguments
    /// - `operator` - The operator's command this cycle
    /// - `meas` - Measured joint positions in canonical joint order
    fn output(&mut self, operator: &CmdVector, meas: &[f64; NUM_JOINTS]) -> ControllerOutput;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Output of a [`Controller`] for one cycle.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerOutput {
    /// Normalised joint commands
    pub cmd: CmdVector,

    /// Tracking error of each joint, in the joint's measurement units
    pub error: [f64; NUM_JOINTS],
}

/// Controller which never commands any motion.
#[derive(Debug, Default)]
pub struct NullController;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Controller for NullController {
    fn output(&mut self, _operator: &CmdVector, _meas: &[f64; NUM_JOINTS]) -> ControllerOutput {
        ControllerOutput::default()
    }
}
