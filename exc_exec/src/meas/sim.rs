//! Simulated sensor inputs
//!
//! Clones share state, so a test (or a simulation driver) can keep a handle to an input owned by a
//! [`MeasChannel`](super::MeasChannel) and move the sensor.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{cell::Cell, path::PathBuf, rc::Rc};

use super::{AnalogInput, EncoderInput, MeasError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated ADC channel.
#[derive(Clone)]
pub struct SimAdc {
    raw: Rc<Cell<f64>>,
    failing: Rc<Cell<bool>>,
}

/// A simulated quadrature encoder.
#[derive(Clone, Default)]
pub struct SimEncoder {
    counts: Rc<Cell<i64>>,
    zero: Rc<Cell<i64>>,
    absolute: Rc<Cell<bool>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimAdc {
    pub fn new(raw: f64) -> Self {
        Self {
            raw: Rc::new(Cell::new(raw)),
            failing: Rc::new(Cell::new(false)),
        }
    }

    /// Set the code the ADC will read.
    pub fn set(&self, raw: f64) {
        self.raw.set(raw);
    }

    /// Make reads fail, as an unplugged sensor would.
    pub fn fail(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl AnalogInput for SimAdc {
    fn read_raw(&mut self) -> Result<f64, MeasError> {
        if self.failing.get() {
            return Err(MeasError::InvalidReading(PathBuf::from("sim"), String::new()))
        }

        Ok(self.raw.get())
    }
}

impl SimEncoder {
    /// Create an encoder at the given raw count.
    pub fn new(counts: i64) -> Self {
        let enc = Self::default();
        enc.counts.set(counts);
        enc
    }

    /// Move the encoder by a number of counts.
    pub fn advance(&self, counts: i64) {
        self.counts.set(self.counts.get() + counts);
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute.get()
    }
}

impl EncoderInput for SimEncoder {
    fn set_absolute(&mut self) -> Result<(), MeasError> {
        self.absolute.set(true);
        Ok(())
    }

    fn zero(&mut self) -> Result<(), MeasError> {
        self.zero.set(self.counts.get());
        Ok(())
    }

    fn position(&mut self) -> Result<i64, MeasError> {
        Ok(self.counts.get() - self.zero.get())
    }
}
