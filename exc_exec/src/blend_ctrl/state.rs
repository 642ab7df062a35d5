//! Implementations for the BlendCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::exc::NUM_JOINTS;
use log::{debug, warn};
use serde::Serialize;

// Internal
use super::{blend, BlendCtrlError, BlendMode};
use crate::js_cmd::CmdVector;
use util::module::State;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Motion class reported when no classification is available.
pub const NO_CLASS: i32 = -1;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Provides the blending factor each cycle.
///
/// A dynamic provider would classify the operator's current motion and raise alpha when it is
/// confident the autonomous controller is doing the same task.
pub trait AlphaProvider {
    fn estimate(&mut self, operator: &CmdVector, meas: &[f64; NUM_JOINTS]) -> MotionEstimate;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Blending control module state
#[derive(Default)]
pub struct BlendCtrl {
    pub(crate) provider: Option<Box<dyn AlphaProvider>>,

    pub(crate) report: StatusReport,
}

/// Data needed to initialise BlendCtrl.
pub struct InitData {
    pub mode: BlendMode,

    /// Provider for [`BlendMode::Dynamic`], ignored in other modes.
    pub provider: Option<Box<dyn AlphaProvider>>,
}

/// Input data to Blend Control.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputData {
    /// The operator's command
    pub operator: CmdVector,

    /// The autonomous controller's command
    pub controller: CmdVector,

    /// Measured joint positions
    pub meas: [f64; NUM_JOINTS],
}

/// The blending factor with the motion classification that produced it.
#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
pub struct MotionEstimate {
    pub alpha: f64,

    /// Motion class, [`NO_CLASS`] if unclassified
    pub class: i32,

    /// Probability the current motion is the nominal task
    pub confidence: f64,
}

/// Status report for BlendCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub estimate: MotionEstimate,
}

/// Provider returning the same alpha every cycle.
#[derive(Debug, Clone, Copy)]
pub struct StaticAlpha(pub f64);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotionEstimate {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            class: NO_CLASS,
            confidence: 0.0,
        }
    }
}

impl AlphaProvider for StaticAlpha {
    fn estimate(&mut self, _operator: &CmdVector, _meas: &[f64; NUM_JOINTS]) -> MotionEstimate {
        MotionEstimate {
            alpha: self.0,
            ..Default::default()
        }
    }
}

impl State for BlendCtrl {
    type InitData = InitData;
    type InitError = BlendCtrlError;

    type InputData = InputData;
    type OutputData = CmdVector;
    type StatusReport = StatusReport;
    type ProcError = BlendCtrlError;

    /// Initialise the BlendCtrl module.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let provider: Box<dyn AlphaProvider> = match init_data.mode {
            BlendMode::Off => Box::new(StaticAlpha(0.0)),
            BlendMode::Static { alpha } => {
                if !(0.0..=1.0).contains(&alpha) {
                    warn!("Static blending alpha {} is outside [0, 1]", alpha);
                }
                Box::new(StaticAlpha(alpha))
            },
            BlendMode::Dynamic => init_data.provider
                .ok_or(BlendCtrlError::NoAlphaProvider)?,
        };

        self.provider = Some(provider);

        self.report = StatusReport::default();

        Ok(())
    }

    /// Blend the operator and controller commands joint by joint.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let provider = self.provider
            .as_mut()
            .ok_or(BlendCtrlError::NotInitialised)?;

        let estimate = provider.estimate(&input_data.operator, &input_data.meas);

        let mut blended = [0.0; NUM_JOINTS];
        for (i, b) in blended.iter_mut().enumerate() {
            *b = blend(
                input_data.operator.0[i],
                input_data.controller.0[i],
                estimate.alpha
            );
        }

        debug!("alpha = {}, blended = {:?}", estimate.alpha, blended);

        self.report = StatusReport { estimate };

        Ok((CmdVector(blended), self.report))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Ramp {
        alpha: f64,
    }

    impl AlphaProvider for Ramp {
        fn estimate(&mut self, _: &CmdVector, _: &[f64; NUM_JOINTS]) -> MotionEstimate {
            self.alpha += 0.5;
            MotionEstimate { alpha: self.alpha, class: 2, confidence: 0.9 }
        }
    }

    fn input() -> InputData {
        InputData {
            operator: CmdVector([1.0, -1.0, 0.5, 0.0]),
            controller: CmdVector([0.0, 1.0, 0.5, 1.0]),
            meas: [0.0; NUM_JOINTS],
        }
    }

    #[test]
    fn test_off_is_operator() {
        let mut bc = BlendCtrl::default();
        bc.init(InitData { mode: BlendMode::Off, provider: None }).unwrap();

        let (out, rpt) = bc.proc(&input()).unwrap();
        assert_eq!(out, input().operator);
        assert_eq!(rpt.estimate.class, NO_CLASS);
    }

    #[test]
    fn test_static() {
        let mut bc = BlendCtrl::default();
        bc.init(InitData { mode: BlendMode::Static { alpha: 0.5 }, provider: None }).unwrap();

        let (out, rpt) = bc.proc(&input()).unwrap();
        assert_eq!(out, CmdVector([0.5, 0.0, 0.5, 0.5]));
        assert_eq!(rpt.estimate.alpha, 0.5);
    }

    #[test]
    fn test_dynamic() {
        let mut bc = BlendCtrl::default();
        assert!(matches!(
            bc.init(InitData { mode: BlendMode::Dynamic, provider: None }),
            Err(BlendCtrlError::NoAlphaProvider)
        ));

        bc.init(InitData {
            mode: BlendMode::Dynamic,
            provider: Some(Box::new(Ramp { alpha: 0.0 })),
        }).unwrap();

        // Whatever alpha the provider gives is used, each cycle
        let (out, rpt) = bc.proc(&input()).unwrap();
        assert_eq!(out, CmdVector([0.5, 0.0, 0.5, 0.5]));
        assert_eq!(rpt.estimate, MotionEstimate { alpha: 0.5, class: 2, confidence: 0.9 });

        let (out, _) = bc.proc(&input()).unwrap();
        assert_eq!(out, input().controller);
    }

    #[test]
    fn test_not_initialised() {
        let mut bc = BlendCtrl::default();
        assert!(matches!(bc.proc(&input()), Err(BlendCtrlError::NotInitialised)));
    }
}
