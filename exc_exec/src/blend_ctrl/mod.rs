//! Blending control module
//!
//! Shares control of the excavator between the operator and the autonomous controller. Each cycle
//! the operator command `u` and the controller command `u'` are blended as
//!
//! ```text
//! u_b = u + alpha * (u' - u)
//! ```
//!
//! so `alpha = 0` is pure operator control and `alpha = 1` pure autonomous control.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during BlendCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum BlendCtrlError {
    #[error("Dynamic blending needs an alpha provider but none was given")]
    NoAlphaProvider,

    #[error("BlendCtrl has not been initialised")]
    NotInitialised,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Blend an operator input with a controller output.
///
/// This is an exact linear interpolation, no clamping is applied.
pub fn blend(operator_input: f64, controller_output: f64, alpha: f64) -> f64 {
    operator_input + alpha * (controller_output - operator_input)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_blend() {
        assert_eq!(blend(1.0, 0.0, 0.0), 1.0);
        assert_eq!(blend(1.0, 0.0, 1.0), 0.0);
        assert_eq!(blend(2.0, 4.0, 0.5), 3.0);
        assert_eq!(blend(-0.5, 0.5, 0.25), -0.25);
    }
}
