//! Calibration tables for the string potentiometers
//!
//! A table maps the analog code read from a string potentiometer to the extension of its actuator.
//! The tables drift as the strings wear, so they must be recalibrated regularly and can be
//! overridden from the parameter file.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;
use comms_if::eqpt::exc::JointId;
use serde::{Serialize, Deserialize};
use util::maths::interp;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const BOOM_RAW: [f64; 17] = [
    536.0, 564.0, 590.0, 627.0, 667.0, 704.0, 717.0, 741.0, 763.0, 789.0, 812.0, 832.0, 848.0,
    864.0, 883.0, 901.0, 914.0,
];
const BOOM_MM: [f64; 17] = [
    0.0, 7.89, 14.32, 22.64, 33.27, 47.4, 50.7, 57.6, 64.2, 72.1, 80.0, 87.4, 93.4, 99.9, 107.0,
    113.4, 118.6,
];

const STICK_RAW: [f64; 19] = [
    554.0, 602.0, 633.0, 660.0, 680.0, 707.0, 736.0, 762.0, 795.0, 820.0, 835.0, 867.0, 892.0,
    919.0, 940.0, 959.0, 983.0, 1007.0, 1019.0,
];
const STICK_MM: [f64; 19] = [
    0.0, 11.7, 19.2, 26.2, 31.0, 38.4, 46.3, 53.7, 63.4, 71.5, 76.3, 87.0, 96.4, 106.1, 114.5,
    122.1, 132.2, 143.1, 148.5,
];

const BUCKET_RAW: [f64; 14] = [
    173.0, 210.0, 258.0, 297.0, 355.0, 382.0, 429.0, 469.0, 500.0, 539.0, 578.0, 612.0, 628.0,
    634.0,
];
const BUCKET_MM: [f64; 14] = [
    0.0, 8.0, 16.5, 23.9, 36.4, 42.4, 53.5, 63.7, 71.6, 81.8, 92.7, 102.5, 107.3, 109.0,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A piecewise linear map from analog code to actuator extension in millimetres.
///
/// Invariants: `raw` and `mm` have the same non-zero length and `raw` is strictly increasing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "CalibTableDef", into = "CalibTableDef")]
pub struct CalibTable {
    raw: Vec<f64>,
    mm: Vec<f64>,
}

/// Unchecked form of a [`CalibTable`] as it appears in a parameter file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CalibTableDef {
    /// Analog codes, strictly increasing
    pub raw: Vec<f64>,

    /// Actuator extension at each code
    ///
    /// Units: millimetres
    pub mm: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CalibError {
    #[error("A calibration table needs at least one point")]
    Empty,

    #[error("Calibration table has {0} codes but {1} values")]
    LengthMismatch(usize, usize),

    #[error("Calibration codes must be strictly increasing, code {0} is not")]
    NotIncreasing(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CalibTable {
    /// Build a table, checking its invariants.
    pub fn new(raw: Vec<f64>, mm: Vec<f64>) -> Result<Self, CalibError> {
        if raw.len() != mm.len() {
            return Err(CalibError::LengthMismatch(raw.len(), mm.len()))
        }
        if raw.is_empty() {
            return Err(CalibError::Empty)
        }
        // NaN codes fail this check too
        if let Some(i) = (1..raw.len()).find(|&i| !(raw[i] > raw[i - 1])) {
            return Err(CalibError::NotIncreasing(i))
        }

        Ok(Self { raw, mm })
    }

    /// The rig calibration for a string potentiometer joint, `None` for the swing which is
    /// measured by an encoder.
    pub fn for_joint(joint: JointId) -> Option<Self> {
        let (raw, mm): (&[f64], &[f64]) = match joint {
            JointId::Boom => (&BOOM_RAW, &BOOM_MM),
            JointId::Stick => (&STICK_RAW, &STICK_MM),
            JointId::Bucket => (&BUCKET_RAW, &BUCKET_MM),
            JointId::Swing => return None,
        };

        Some(Self { raw: raw.to_vec(), mm: mm.to_vec() })
    }

    /// Extension in millimetres for the given analog code.
    ///
    /// Codes outside the table are held at the first or last extension.
    pub fn interp(&self, raw: f64) -> f64 {
        // The table invariants guarantee a value
        interp(raw, &self.raw, &self.mm).unwrap_or(self.mm[0])
    }

    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    pub fn mm(&self) -> &[f64] {
        &self.mm
    }
}

impl TryFrom<CalibTableDef> for CalibTable {
    type Error = CalibError;

    fn try_from(def: CalibTableDef) -> Result<Self, Self::Error> {
        CalibTable::new(def.raw, def.mm)
    }
}

impl From<CalibTable> for CalibTableDef {
    fn from(table: CalibTable) -> Self {
        CalibTableDef { raw: table.raw, mm: table.mm }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_builtin_tables_valid() {
        for joint in &[JointId::Boom, JointId::Stick, JointId::Bucket] {
            let t = CalibTable::for_joint(*joint).unwrap();
            assert_eq!(CalibTable::new(t.raw().to_vec(), t.mm().to_vec()), Ok(t));
        }
        assert!(CalibTable::for_joint(JointId::Swing).is_none());
    }

    #[test]
    fn test_invalid_tables() {
        assert_eq!(CalibTable::new(vec![], vec![]), Err(CalibError::Empty));
        assert_eq!(
            CalibTable::new(vec![1.0, 2.0], vec![0.0]),
            Err(CalibError::LengthMismatch(2, 1))
        );
        assert_eq!(
            CalibTable::new(vec![1.0, 2.0, 2.0], vec![0.0, 1.0, 2.0]),
            Err(CalibError::NotIncreasing(2))
        );
    }

    #[test]
    fn test_interp_bounds_and_monotonic() {
        let t = CalibTable::for_joint(JointId::Stick).unwrap();

        assert_eq!(t.interp(554.0), 0.0);
        assert_eq!(t.interp(100.0), 0.0);
        assert_eq!(t.interp(1019.0), 148.5);
        assert_eq!(t.interp(4095.0), 148.5);
        assert_eq!(t.interp(707.0), 38.4);

        let mut last = t.interp(500.0);
        for code in 500..1100 {
            let v = t.interp(code as f64);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_deserialize() {
        #[derive(Deserialize)]
        struct P {
            table: CalibTable,
        }

        let p: P = toml::from_str("table = { raw = [0.0, 100.0], mm = [0.0, 50.0] }").unwrap();
        assert_eq!(p.table.interp(50.0), 25.0);

        let bad: Result<P, _> = toml::from_str("table = { raw = [100.0, 0.0], mm = [0.0, 50.0] }");
        assert!(bad.is_err());
    }
}
