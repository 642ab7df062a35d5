//! # Servo Controller Module
//!
//! This module provides the actuator channel for a PWM driven hydraulic valve, abstracted over the
//! board which actually generates the PWM signal.
//!
//! Each valve is driven by a servo-style PWM signal whose duty cycle sets the spool position. The
//! middle of the duty range is the neutral (closed) position, so a [`Servo`] starts there and any
//! command is mapped symmetrically around it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`PwmDriver`] implementation for the Linux sysfs PWM interface.
pub mod sysfs;

/// [`PwmDriver`] implementation which only records what it was asked to do.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;
use comms_if::eqpt::exc::JointId;
use log::{debug, warn};
use serde::{Serialize, Deserialize};
use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Frequency of the valve PWM signal.
pub const PWM_FREQ_HZ: f64 = 50.625;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing PWM outputs.
pub trait PwmDriver {

    /// Start generating the signal with the given duty cycle (percent) and frequency.
    fn start(&mut self, duty_pct: f64, freq_hz: f64) -> Result<(), ServoError>;

    /// Set the duty cycle of a started output.
    ///
    /// ## Arguments
    /// - `duty_pct` - The duty cycle to set. Must be a value between 0.0 and 100.0. Values outside
    ///   this range will be rejected.
    fn set_duty_cycle(&mut self, duty_pct: f64) -> Result<(), ServoError>;

    /// Stop the signal and release the output.
    fn stop(&mut self) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An actuator channel driving one hydraulic valve.
///
/// The commanded duty cycle is always within `[duty_min, duty_max]`. The output is stopped when the
/// servo is closed, or dropped without being closed.
pub struct Servo {
    /// The output, `None` once the servo has been closed.
    driver: Option<Box<dyn PwmDriver>>,

    joint: JointId,

    js_index: usize,

    duty_min: f64,

    duty_max: f64,

    duty_span: f64,

    duty_mid: f64,

    duty_set: f64,
}

/// Configuration of a single servo.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServoParams {
    /// The joint this valve moves
    pub joint: JointId,

    /// Duty cycle at one end of the valve's travel
    ///
    /// Units: percent
    pub duty_min_pct: f64,

    /// Duty cycle at the other end of the valve's travel
    ///
    /// Units: percent
    pub duty_max_pct: f64,

    /// Index of the axis in the joystick datagram which commands this valve
    pub js_index: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("Duty cycle range is invalid, expected min ({0}) < max ({1})")]
    InvalidDutyRange(f64, f64),

    #[error("Duty cycle must be between 0.0 and 100.0, got {0}")]
    InvalidDutyCycle(f64),

    #[error("Could not access {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("The output is not running")]
    NotRunning,

    #[error("The servo has been closed")]
    Closed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Servo {
    /// Create a new servo, immediately starting the output at the neutral duty cycle.
    ///
    /// ## Arguments
    /// - `driver` - The PWM output for this valve
    /// - `params` - The duty cycle limits and joystick mapping for this valve
    pub fn new(
        mut driver: Box<dyn PwmDriver>,
        params: &ServoParams
    ) -> Result<Self, ServoError> {

        let duty_min = params.duty_min_pct;
        let duty_max = params.duty_max_pct;

        if !(duty_min < duty_max) {
            return Err(ServoError::InvalidDutyRange(duty_min, duty_max))
        }

        let duty_span = duty_max - duty_min;

        // Neutral is the 90 degree point of a 180 degree servo range
        let duty_mid = duty_min + 0.5 * duty_span;

        debug!("Starting {} servo PWM at {:.3} %", params.joint, duty_mid);
        driver.start(duty_mid, PWM_FREQ_HZ)?;

        Ok(Self {
            driver: Some(driver),
            joint: params.joint,
            js_index: params.js_index,
            duty_min,
            duty_max,
            duty_span,
            duty_mid,
            duty_set: duty_mid,
        })
    }

    /// Set the demanded position of the valve from a normalised command in `[-1, 1]`.
    ///
    /// Zero maps to neutral. The result is saturated at the duty cycle limits, and a non-finite
    /// command is treated as neutral. Nothing is written until [`Servo::apply`] is called.
    pub fn set_command(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() { fraction } else { 0.0 };

        let duty = self.duty_mid + fraction * (self.duty_span / 2.0);

        self.duty_set = clamp(&duty, &self.duty_min, &self.duty_max);
    }

    /// Write the demanded duty cycle to the output.
    pub fn apply(&mut self) -> Result<(), ServoError> {
        match self.driver {
            Some(ref mut d) => d.set_duty_cycle(self.duty_set),
            None => Err(ServoError::Closed)
        }
    }

    /// Stop the output and release it.
    pub fn close(mut self) -> Result<(), ServoError> {
        match self.driver.take() {
            Some(mut d) => {
                debug!("Stopping {} servo PWM", self.joint);
                d.stop()
            },
            None => Ok(())
        }
    }

    pub fn joint(&self) -> JointId {
        self.joint
    }

    pub fn js_index(&self) -> usize {
        self.js_index
    }

    pub fn duty_set(&self) -> f64 {
        self.duty_set
    }

    pub fn duty_min(&self) -> f64 {
        self.duty_min
    }

    pub fn duty_max(&self) -> f64 {
        self.duty_max
    }

    pub fn duty_mid(&self) -> f64 {
        self.duty_mid
    }

    pub fn duty_span(&self) -> f64 {
        self.duty_span
    }
}

impl Drop for Servo {
    fn drop(&mut self) {
        if let Some(mut d) = self.driver.take() {
            warn!("{} servo dropped without being closed, stopping output", self.joint);
            if let Err(e) = d.stop() {
                warn!("Could not stop {} servo output: {}", self.joint, e);
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Reject duty cycles no PWM output can produce.
fn check_duty(duty_pct: f64) -> Result<(), ServoError> {
    if (0.0..=100.0).contains(&duty_pct) {
        Ok(())
    }
    else {
        Err(ServoError::InvalidDutyCycle(duty_pct))
    }
}
