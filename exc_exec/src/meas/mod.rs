//! # Measurement Module
//!
//! Converts raw sensor readings into joint positions. The boom, stick and bucket cylinders carry
//! string potentiometers read through the ADC and converted with a calibration table, the swing
//! carries a quadrature encoder.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Calibration tables for the string potentiometers.
pub mod calib;

/// Sensor inputs read through Linux sysfs.
pub mod sysfs;

/// Simulated sensor inputs.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;
use comms_if::eqpt::exc::JointId;

pub use calib::{CalibError, CalibTable};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Encoder counts per pi radians of swing.
///
/// 360 counts per shaft revolution, a 5:1 reduction between shaft and swing, and 4 counts per
/// line in quadrature give 7200 counts per swing revolution.
pub const COUNTS_PER_PI_RAD: f64 = 3200.0;

/// Millimetres per centimetre, calibration tables are in millimetres but positions are reported in
/// centimetres.
const MM_PER_CM: f64 = 10.0;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An analog input returning raw ADC codes.
pub trait AnalogInput {
    fn read_raw(&mut self) -> Result<f64, MeasError>;
}

/// A quadrature encoder input.
pub trait EncoderInput {
    /// Report positions relative to the last zero rather than per-period deltas.
    fn set_absolute(&mut self) -> Result<(), MeasError>;

    /// Make the current position the zero position.
    fn zero(&mut self) -> Result<(), MeasError>;

    /// Current position in counts.
    fn position(&mut self) -> Result<i64, MeasError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A string potentiometer channel.
pub struct AnalogChannel {
    joint: JointId,
    input: Box<dyn AnalogInput>,
    table: CalibTable,
    value_cm: f64,
}

/// A quadrature encoder channel.
pub struct EncoderChannel {
    joint: JointId,
    input: Box<dyn EncoderInput>,
    value_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A measurement channel for one joint.
pub enum MeasChannel {
    /// Position in centimetres from a string potentiometer
    Analog(AnalogChannel),

    /// Angle in radians from an encoder
    Encoder(EncoderChannel),
}

#[derive(thiserror::Error, Debug)]
pub enum MeasError {
    #[error("Could not access {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Could not parse \"{1}\" read from {0:?}")]
    InvalidReading(PathBuf, String),

    #[error("No calibration table available for {0}")]
    NoCalibTable(JointId),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert an analog code to actuator extension in centimetres.
pub fn analog_to_cm(raw: f64, table: &CalibTable) -> f64 {
    table.interp(raw) / MM_PER_CM
}

/// Convert encoder counts to an angle in radians.
pub fn ticks_to_rad(ticks: i64) -> f64 {
    ticks as f64 * std::f64::consts::PI / COUNTS_PER_PI_RAD
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MeasChannel {
    /// Create a string potentiometer channel.
    ///
    /// If `table` is `None` the rig calibration for the joint is used.
    pub fn analog(
        joint: JointId,
        input: Box<dyn AnalogInput>,
        table: Option<CalibTable>
    ) -> Result<Self, MeasError> {
        let table = match table {
            Some(t) => t,
            None => CalibTable::for_joint(joint).ok_or(MeasError::NoCalibTable(joint))?
        };

        Ok(MeasChannel::Analog(AnalogChannel {
            joint,
            input,
            table,
            value_cm: 0.0,
        }))
    }

    /// Create an encoder channel, zeroing the encoder at its current position.
    pub fn encoder(
        joint: JointId,
        mut input: Box<dyn EncoderInput>
    ) -> Result<Self, MeasError> {
        input.set_absolute()?;
        input.zero()?;

        Ok(MeasChannel::Encoder(EncoderChannel {
            joint,
            input,
            value_rad: 0.0,
        }))
    }

    /// Read the sensor and update the stored value, which is also returned.
    ///
    /// If the sensor can't be read the previous value is kept.
    pub fn update(&mut self) -> Result<f64, MeasError> {
        match self {
            MeasChannel::Analog(c) => {
                let raw = c.input.read_raw()?;
                c.value_cm = analog_to_cm(raw, &c.table);
                Ok(c.value_cm)
            },
            MeasChannel::Encoder(c) => {
                let ticks = c.input.position()?;
                c.value_rad = ticks_to_rad(ticks);
                Ok(c.value_rad)
            }
        }
    }

    /// The last measured value, centimetres for string potentiometers and radians for encoders.
    pub fn value(&self) -> f64 {
        match self {
            MeasChannel::Analog(c) => c.value_cm,
            MeasChannel::Encoder(c) => c.value_rad,
        }
    }

    pub fn joint(&self) -> JointId {
        match self {
            MeasChannel::Analog(c) => c.joint,
            MeasChannel::Encoder(c) => c.joint,
        }
    }
}
