//! # Excavator Equipment Demands
//!
//! The joystick sender streams one datagram per cycle containing the four joystick axes, rendered
//! as a list, for example `[0.0, -0.25, 0.5, 1.0]`. The axes are already in wire order
//! `[BM, SK, BK, SW]` when they leave the sender.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of actuated joints on the excavator, and number of axes in a joystick datagram.
pub const NUM_JOINTS: usize = 4;

/// Characters used to decorate a list rendering, removed before splitting into axes.
const WIRE_DECORATION: [char; 5] = ['[', '(', ' ', ')', ']'];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The four joystick axes carried by one datagram, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JsAxes(pub [f64; NUM_JOINTS]);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The joints of the excavator, in canonical order.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum JointId {
    Boom,
    Stick,
    Bucket,
    Swing,
}

/// Which joystick was selected as primary by squeezing its trigger.
///
/// The two joysticks enumerate in an order that depends on how they were plugged in, so the sender
/// needs to know which one is on the right before it can put the axes in wire order.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum AxisOrder {
    /// Trigger pressed on joystick 0
    Tm0Primary,

    /// Trigger pressed on joystick 1
    Tm1Primary,
}

/// Errors which can occur while decoding a joystick datagram.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WireError {
    #[error("Axis {index} (\"{token}\") is not a finite number")]
    InvalidAxis { index: usize, token: String },

    #[error("Expected {} axes but found {0}", NUM_JOINTS)]
    WrongAxisCount(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// All joints in canonical order.
    pub const ALL: [JointId; NUM_JOINTS] = [
        JointId::Boom,
        JointId::Stick,
        JointId::Bucket,
        JointId::Swing,
    ];

    /// Position of this joint in canonical order.
    pub fn index(&self) -> usize {
        match self {
            JointId::Boom => 0,
            JointId::Stick => 1,
            JointId::Bucket => 2,
            JointId::Swing => 3,
        }
    }

    /// Human readable name, as used in the data log headers.
    pub fn name(&self) -> &'static str {
        match self {
            JointId::Boom => "Boom",
            JointId::Stick => "Stick",
            JointId::Bucket => "Bucket",
            JointId::Swing => "Swing",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AxisOrder {
    /// Indices into the raw axes `[tm0.x, tm0.y, tm1.x, tm1.y]` which give the wire order
    /// `[BM, SK, BK, SW]`.
    pub fn permutation(&self) -> [usize; NUM_JOINTS] {
        match self {
            AxisOrder::Tm0Primary => [1, 3, 0, 2],
            AxisOrder::Tm1Primary => [3, 1, 2, 0],
        }
    }

    /// Put raw joystick axes into wire order.
    pub fn apply(&self, raw: [f64; NUM_JOINTS]) -> JsAxes {
        let perm = self.permutation();
        let mut axes = [0.0; NUM_JOINTS];

        for (axis, &src) in axes.iter_mut().zip(perm.iter()) {
            *axis = raw[src];
        }

        JsAxes(axes)
    }
}

impl FromStr for AxisOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tm0" | "0" => Ok(AxisOrder::Tm0Primary),
            "tm1" | "1" => Ok(AxisOrder::Tm1Primary),
            _ => Err(format!("\"{}\" is not a joystick, expected tm0 or tm1", s)),
        }
    }
}

impl JsAxes {
    /// Render the axes as they are sent on the wire.
    ///
    /// Each value uses the shortest representation which parses back to the same float.
    pub fn to_wire(&self) -> String {
        let vals: Vec<String> = self.0.iter().map(|v| format!("{:?}", v)).collect();

        format!("[{}]", vals.join(", "))
    }

    /// Decode the axes from a received datagram.
    ///
    /// List or tuple decoration and whitespace are ignored. Every axis must parse as a finite
    /// number and there must be exactly [`NUM_JOINTS`] of them, otherwise no axes are produced.
    pub fn from_wire(msg: &str) -> Result<Self, WireError> {
        let stripped: String = msg
            .chars()
            .filter(|c| !WIRE_DECORATION.contains(c))
            .collect();

        let vals = stripped
            .split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                match token.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(WireError::InvalidAxis {
                        index,
                        token: token.to_string(),
                    }),
                }
            })
            .collect::<Result<Vec<f64>, WireError>>()?;

        if vals.len() != NUM_JOINTS {
            return Err(WireError::WrongAxisCount(vals.len()));
        }

        let mut axes = [0.0; NUM_JOINTS];
        axes.copy_from_slice(&vals);

        Ok(JsAxes(axes))
    }
}
