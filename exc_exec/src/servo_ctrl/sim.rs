//! [`PwmDriver`] implementation which only records what it was asked to do.
//!
//! Used when running the executable without the rig connected and in tests. Clones share the same
//! state so a test can keep a handle to an output owned by a [`Servo`](super::Servo).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{cell::RefCell, rc::Rc};

use super::{check_duty, PwmDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated PWM output.
#[derive(Clone, Default)]
pub struct SimPwm {
    state: Rc<RefCell<SimPwmState>>,
}

/// Everything the simulated output has been asked to do.
#[derive(Clone, Debug, Default)]
pub struct SimPwmState {
    /// True between `start` and `stop`
    pub running: bool,

    /// Frequency given to the last `start`
    pub freq_hz: Option<f64>,

    /// Last duty cycle set, by `start` or `set_duty_cycle`
    pub duty_pct: Option<f64>,

    /// Every duty cycle passed to `set_duty_cycle`
    pub writes: Vec<f64>,

    /// Number of times the output was stopped
    pub stops: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimPwm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the current state of the output.
    pub fn state(&self) -> SimPwmState {
        self.state.borrow().clone()
    }
}

impl PwmDriver for SimPwm {
    fn start(&mut self, duty_pct: f64, freq_hz: f64) -> Result<(), ServoError> {
        check_duty(duty_pct)?;

        let mut s = self.state.borrow_mut();
        s.running = true;
        s.freq_hz = Some(freq_hz);
        s.duty_pct = Some(duty_pct);

        Ok(())
    }

    fn set_duty_cycle(&mut self, duty_pct: f64) -> Result<(), ServoError> {
        check_duty(duty_pct)?;

        let mut s = self.state.borrow_mut();
        if !s.running {
            return Err(ServoError::NotRunning)
        }
        s.duty_pct = Some(duty_pct);
        s.writes.push(duty_pct);

        Ok(())
    }

    fn stop(&mut self) -> Result<(), ServoError> {
        let mut s = self.state.borrow_mut();
        s.running = false;
        s.stops += 1;

        Ok(())
    }
}

