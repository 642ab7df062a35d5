//! # Joystick command parsing
//!
//! Turns a received joystick datagram into a command vector in joint order. Small deflections are
//! removed by a deadzone and the bucket joystick axes are inverted.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;
use comms_if::eqpt::exc::{JointId, JsAxes, WireError, NUM_JOINTS};
use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Joystick deflections with a magnitude at or below this are treated as zero.
pub const DEADZONE: f64 = 0.1;

/// Sign applied to each wire axis. The third and fourth axes come from the bucket joystick, which
/// is mounted the other way round.
pub const AXIS_SIGN: [f64; NUM_JOINTS] = [-1.0, -1.0, 1.0, 1.0];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Normalised commands in `[-1, 1]`, indexed by [`JointId::index`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct CmdVector(pub [f64; NUM_JOINTS]);

/// For each joint, in canonical order, the index of the wire axis which commands it.
///
/// Always a permutation of the wire axes, including when deserialised.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(try_from = "[usize; NUM_JOINTS]")]
pub struct AxisMap([usize; NUM_JOINTS]);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Malformed joystick message: {0}")]
    Malformed(WireError),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AxisMapError {
    #[error("Wire axis {0} does not exist")]
    OutOfRange(usize),

    #[error("Wire axis {0} is mapped to more than one joint")]
    Duplicate(usize),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a joystick datagram into a command vector.
///
/// No vector is produced if any axis is malformed, the caller should hold the previous command.
pub fn parse(msg: &str, map: &AxisMap) -> Result<CmdVector, ParseError> {
    let JsAxes(axes) = JsAxes::from_wire(msg).map_err(ParseError::Malformed)?;

    let mut wire = [0.0; NUM_JOINTS];
    for (i, v) in axes.iter().enumerate() {
        wire[i] = apply_deadzone(*v) * AXIS_SIGN[i];
        // Keep zeros positive
        if wire[i] == 0.0 {
            wire[i] = 0.0;
        }
    }

    Ok(map.reorder(wire))
}

/// Force deflections inside the deadzone to exactly zero.
pub fn apply_deadzone(value: f64) -> f64 {
    if value > DEADZONE || value < -DEADZONE {
        value
    }
    else {
        0.0
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AxisMap {
    /// Build a map, checking it is a permutation of the wire axes.
    pub fn new(wire_index: [usize; NUM_JOINTS]) -> Result<Self, AxisMapError> {
        let mut seen = [false; NUM_JOINTS];

        for &i in wire_index.iter() {
            if i >= NUM_JOINTS {
                return Err(AxisMapError::OutOfRange(i))
            }
            if seen[i] {
                return Err(AxisMapError::Duplicate(i))
            }
            seen[i] = true;
        }

        Ok(Self(wire_index))
    }

    /// Joint order is wire order.
    pub fn identity() -> Self {
        Self([0, 1, 2, 3])
    }

    /// Wire axis commanding the given joint.
    pub fn wire_index(&self, joint: JointId) -> usize {
        self.0[joint.index()]
    }

    fn reorder(&self, wire: [f64; NUM_JOINTS]) -> CmdVector {
        let mut cmd = [0.0; NUM_JOINTS];

        for joint in JointId::ALL.iter() {
            cmd[joint.index()] = wire[self.wire_index(*joint)];
        }

        CmdVector(cmd)
    }
}

impl TryFrom<[usize; NUM_JOINTS]> for AxisMap {
    type Error = AxisMapError;

    fn try_from(wire_index: [usize; NUM_JOINTS]) -> Result<Self, Self::Error> {
        AxisMap::new(wire_index)
    }
}

impl CmdVector {
    /// Command for a single joint.
    pub fn get(&self, joint: JointId) -> f64 {
        self.0[joint.index()]
    }
}
