//! # Excavator Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;
use comms_if::eqpt::exc::{JointId, NUM_JOINTS};
use serde::{Serialize, Deserialize};
use util::logger::LogLevels;

use crate::{
    blend_ctrl::BlendMode,
    data_logger::LogMode,
    meas::{CalibTable, sysfs::{SysfsAdcConfig, SysfsEqepConfig}},
    servo_ctrl::{ServoParams, sysfs::SysfsPwmConfig},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the excavator executable, loaded from `exc_exec.toml`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExcExecParams {
    /// Which command drives the valves, also selects the data log columns. Either a name or 1
    /// (manual), 2 (autonomous) or 3 (blended).
    pub mode: LogMode,

    /// How operator and controller commands are blended in blended mode
    #[serde(default)]
    pub blend: BlendMode,

    /// Target duration of one control cycle
    ///
    /// Units: seconds
    #[serde(default = "default_cycle_period_s")]
    pub cycle_period_s: f64,

    /// Hardware to run against
    #[serde(default)]
    pub hardware: Hardware,

    /// Stem of the data file name, the date and time are appended
    #[serde(default = "default_data_file_stem")]
    pub data_file_stem: String,

    /// Terminal and log file verbosity
    #[serde(default)]
    pub log: LogLevels,

    /// One entry per joint
    pub joints: Vec<JointParams>,
}

/// Valve and sensor configuration of a single joint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JointParams {
    pub servo: ServoParams,

    /// PWM output driving the valve, only used with [`Hardware::Sysfs`]
    pub pwm: SysfsPwmConfig,

    pub meas: MeasParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Hardware backend for the valves and sensors.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Hardware {
    /// PWM, ADC and eQEP devices through Linux sysfs
    Sysfs,

    /// Simulated devices, for running off the rig
    Sim,
}

/// Sensor on a joint.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeasParams {
    /// String potentiometer read through the ADC
    Analog {
        adc: SysfsAdcConfig,

        /// Overrides the rig calibration for the joint
        #[serde(default)]
        table: Option<CalibTable>,
    },

    /// Quadrature encoder
    Encoder {
        eqep: SysfsEqepConfig,
    },
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParamsError {
    #[error("No joint parameters given for the {0}")]
    MissingJoint(JointId),

    #[error("Joint parameters for the {0} are given more than once")]
    DuplicateJoint(JointId),

    #[error("Cycle period must be a positive number of seconds which fits a duration, got {0} s")]
    InvalidCyclePeriod(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Hardware {
    fn default() -> Self {
        Hardware::Sysfs
    }
}

impl ExcExecParams {
    /// Check every joint is configured exactly once and the cycle period is usable.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.cycle_period()?;

        let mut seen = [false; NUM_JOINTS];
        for j in self.joints.iter() {
            let i = j.servo.joint.index();
            if seen[i] {
                return Err(ParamsError::DuplicateJoint(j.servo.joint))
            }
            seen[i] = true;
        }

        match JointId::ALL.iter().find(|j| !seen[j.index()]) {
            Some(j) => Err(ParamsError::MissingJoint(*j)),
            None => Ok(())
        }
    }

    /// Target duration of one control cycle.
    pub fn cycle_period(&self) -> Result<Duration, ParamsError> {
        match Duration::try_from_secs_f64(self.cycle_period_s) {
            Ok(d) if d > Duration::ZERO => Ok(d),
            _ => Err(ParamsError::InvalidCyclePeriod(self.cycle_period_s))
        }
    }

    /// Parameters of the given joint.
    pub fn joint(&self, joint: JointId) -> Option<&JointParams> {
        self.joints.iter().find(|j| j.servo.joint == joint)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_cycle_period_s() -> f64 {
    0.05
}

fn default_data_file_stem() -> String {
    String::from("exc_exec")
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// The rig configuration, run on simulated hardware.
    pub(crate) const SIM_PARAMS: &str = r#"
        mode = "blended"
        hardware = "sim"

        [blend]
        type = "static"
        alpha = 0.5

        [[joints]]
        servo = { joint = "boom", duty_min_pct = 4.939, duty_max_pct = 10.01, js_index = 2 }
        pwm = { chip = 1, channel = 0 }
        meas = { type = "analog", adc = { ain = 2 } }

        [[joints]]
        servo = { joint = "stick", duty_min_pct = 4.929, duty_max_pct = 8.861, js_index = 3 }
        pwm = { chip = 5, channel = 1 }
        meas = { type = "analog", adc = { ain = 4 } }

        [[joints]]
        servo = { joint = "bucket", duty_min_pct = 5.198, duty_max_pct = 10.03, js_index = 0 }
        pwm = { chip = 3, channel = 1 }
        meas = { type = "analog", adc = { ain = 6 } }

        [[joints]]
        servo = { joint = "swing", duty_min_pct = 4.939, duty_max_pct = 10.0, js_index = 1 }
        pwm = { chip = 0, channel = 0 }
        meas = { type = "encoder", eqep = { dir = "/sys/devices/platform/ocp/48302000.epwmss/48302180.eqep" } }
    "#;

    pub(crate) fn sim_params() -> ExcExecParams {
        toml::from_str(SIM_PARAMS).unwrap()
    }

    #[test]
    fn test_load() {
        let p = sim_params();

        assert_eq!(p.mode, LogMode::Blended);
        assert_eq!(p.blend, BlendMode::Static { alpha: 0.5 });
        assert_eq!(p.hardware, Hardware::Sim);
        assert_eq!(p.cycle_period_s, 0.05);
        assert_eq!(p.data_file_stem, "exc_exec");
        assert_eq!(p.log, LogLevels::default());
        assert_eq!(p.validate(), Ok(()));

        assert_eq!(p.joint(JointId::Stick).unwrap().servo.js_index, 3);
        assert!(matches!(
            p.joint(JointId::Swing).unwrap().meas,
            MeasParams::Encoder { .. }
        ));
    }

    #[test]
    fn test_shipped_params() {
        let p: ExcExecParams = toml::from_str(
            include_str!("../../params/exc_exec.toml")
        ).unwrap();

        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.hardware, Hardware::Sysfs);
        assert!(p.log.validate().is_ok());
        assert_eq!(
            p.log.targets["exc_lib::blend_ctrl"],
            util::logger::LevelFilter::Info
        );

        let net: comms_if::net::NetParams = toml::from_str(
            include_str!("../../params/net.toml")
        ).unwrap();
        assert_eq!(net.js_target_endpoint, "192.168.10.2:9999");
    }

    #[test]
    fn test_table_override() {
        let p: ExcExecParams = toml::from_str(r#"
            mode = "manual"

            [[joints]]
            servo = { joint = "boom", duty_min_pct = 4.939, duty_max_pct = 10.01, js_index = 2 }
            pwm = { chip = 1, channel = 0 }
            meas = { type = "analog", adc = { ain = 2 }, table = { raw = [0.0, 100.0], mm = [0.0, 50.0] } }
        "#).unwrap();

        assert_eq!(p.hardware, Hardware::Sysfs);
        assert_eq!(p.blend, BlendMode::Off);
        match &p.joints[0].meas {
            MeasParams::Analog { table: Some(t), .. } => assert_eq!(t.mm(), &[0.0, 50.0]),
            m => panic!("Unexpected measurement parameters {:?}", m),
        }

        // Only the boom is configured
        assert_eq!(p.validate(), Err(ParamsError::MissingJoint(JointId::Stick)));

        // Tables which break their invariants are rejected on load
        assert!(toml::from_str::<ExcExecParams>(r#"
            mode = "manual"

            [[joints]]
            servo = { joint = "boom", duty_min_pct = 4.939, duty_max_pct = 10.01, js_index = 2 }
            pwm = { chip = 1, channel = 0 }
            meas = { type = "analog", adc = { ain = 2 }, table = { raw = [100.0, 0.0], mm = [0.0, 50.0] } }
        "#).is_err());
    }

    #[test]
    fn test_validate() {
        let mut p = sim_params();
        p.joints.push(p.joints[0].clone());
        assert_eq!(p.validate(), Err(ParamsError::DuplicateJoint(JointId::Boom)));

        let mut p = sim_params();
        p.cycle_period_s = 0.0;
        assert_eq!(p.validate(), Err(ParamsError::InvalidCyclePeriod(0.0)));
    }

    #[test]
    fn test_cycle_period() {
        let mut p = sim_params();
        assert_eq!(p.cycle_period(), Ok(Duration::from_millis(50)));

        // Too long to be a duration
        p.cycle_period_s = 1e20;
        assert_eq!(p.validate(), Err(ParamsError::InvalidCyclePeriod(1e20)));

        for bad in &[-0.05, f64::NAN, f64::INFINITY, 1e-12] {
            p.cycle_period_s = *bad;
            assert!(matches!(p.cycle_period(), Err(ParamsError::InvalidCyclePeriod(_))));
        }
    }
}
