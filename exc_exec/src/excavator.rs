//! # Excavator
//!
//! Owns the valve servos and joint sensors of the excavator. Everything is created once at startup
//! and indexed in canonical joint order.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::exc::{JointId, NUM_JOINTS};
use log::{debug, info, warn};

use crate::{
    js_cmd::{AxisMap, AxisMapError, CmdVector},
    meas::{
        MeasChannel, MeasError,
        sim::{SimAdc, SimEncoder},
        sysfs::{SysfsAdc, SysfsEqep},
    },
    params::{ExcExecParams, Hardware, MeasParams, ParamsError},
    servo_ctrl::{
        PwmDriver, Servo, ServoError,
        sim::SimPwm,
        sysfs::SysfsPwm,
    },
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The excavator's actuators and sensors.
///
/// There is exactly one measurement channel per joint, and either one servo per joint or, for a
/// measurement-only excavator, no servos at all. Dropping the excavator stops every PWM output.
pub struct Excavator {
    servos: Vec<Servo>,

    meas: Vec<MeasChannel>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ExcavatorError {
    #[error("Invalid parameters: {0}")]
    ParamsError(ParamsError),

    #[error("{0} servo error: {1}")]
    ServoError(JointId, ServoError),

    #[error("{0} measurement error: {1}")]
    MeasError(JointId, MeasError),

    #[error("No {1} given for the {0}")]
    MissingJoint(JointId, &'static str),

    #[error("More than one {1} given for the {0}")]
    DuplicateJoint(JointId, &'static str),

    #[error("Invalid joystick mapping: {0}")]
    AxisMapError(AxisMapError),

    #[error("The excavator was opened without its valves")]
    NoValves,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Excavator {
    /// Open the hardware described by the parameters.
    ///
    /// Every servo is started at neutral. In a mode which doesn't drive the valves no PWM output
    /// is opened. With [`Hardware::Sim`] no devices are touched.
    pub fn new(params: &ExcExecParams) -> Result<Self, ExcavatorError> {
        params.validate().map_err(ExcavatorError::ParamsError)?;

        let drives_valves = params.mode.drives_valves();
        let mut servos = Vec::with_capacity(NUM_JOINTS);
        let mut meas = Vec::with_capacity(NUM_JOINTS);

        for joint_params in params.joints.iter() {
            let joint = joint_params.servo.joint;

            if drives_valves {
                let driver: Box<dyn PwmDriver> = match params.hardware {
                    Hardware::Sysfs => Box::new(
                        SysfsPwm::new(&joint_params.pwm)
                            .map_err(|e| ExcavatorError::ServoError(joint, e))?
                    ),
                    Hardware::Sim => Box::new(SimPwm::new()),
                };

                servos.push(
                    Servo::new(driver, &joint_params.servo)
                        .map_err(|e| ExcavatorError::ServoError(joint, e))?
                );
            }

            let channel = match (&joint_params.meas, params.hardware) {
                (MeasParams::Analog { adc, table }, Hardware::Sysfs) => MeasChannel::analog(
                    joint,
                    Box::new(SysfsAdc::new(adc)),
                    table.clone()
                ),
                (MeasParams::Analog { table, .. }, Hardware::Sim) => MeasChannel::analog(
                    joint,
                    Box::new(SimAdc::new(0.0)),
                    table.clone()
                ),
                (MeasParams::Encoder { eqep }, Hardware::Sysfs) => SysfsEqep::new(eqep)
                    .and_then(|e| MeasChannel::encoder(joint, Box::new(e))),
                (MeasParams::Encoder { .. }, Hardware::Sim) => MeasChannel::encoder(
                    joint,
                    Box::new(SimEncoder::new(0))
                ),
            }.map_err(|e| ExcavatorError::MeasError(joint, e))?;

            meas.push(channel);

            debug!("{} channels ready", joint);
        }

        if drives_valves {
            info!("Excavator hardware ({:?}) initialised, all valves at neutral", params.hardware);
        }
        else {
            info!("Excavator sensors ({:?}) initialised, valves unpowered", params.hardware);
        }

        Self::from_parts(servos, meas)
    }

    /// Assemble an excavator from channels which have already been created.
    ///
    /// The channels may be given in any order but each joint must appear exactly once in each. No
    /// servos at all gives a measurement-only excavator.
    pub fn from_parts(
        mut servos: Vec<Servo>,
        mut meas: Vec<MeasChannel>
    ) -> Result<Self, ExcavatorError> {
        if !servos.is_empty() {
            check_joints(servos.iter().map(|s| s.joint()), "servo")?;
        }
        check_joints(meas.iter().map(|m| m.joint()), "measurement channel")?;

        servos.sort_by_key(|s| s.joint().index());
        meas.sort_by_key(|m| m.joint().index());

        Ok(Self { servos, meas })
    }

    /// False for a measurement-only excavator.
    pub fn has_valves(&self) -> bool {
        !self.servos.is_empty()
    }

    /// The joystick axis map implied by each servo's joystick index.
    pub fn axis_map(&self) -> Result<AxisMap, ExcavatorError> {
        if !self.has_valves() {
            return Err(ExcavatorError::NoValves)
        }

        let mut wire_index = [0usize; NUM_JOINTS];

        for s in self.servos.iter() {
            wire_index[s.joint().index()] = s.js_index();
        }

        AxisMap::new(wire_index).map_err(ExcavatorError::AxisMapError)
    }

    /// Read every sensor and return the joint positions.
    ///
    /// A sensor which can't be read keeps its previous value.
    pub fn update_measurements(&mut self) -> [f64; NUM_JOINTS] {
        for m in self.meas.iter_mut() {
            if let Err(e) = m.update() {
                warn!("Could not update the {} measurement: {}", m.joint(), e);
            }
        }

        self.measurements()
    }

    /// The last measured joint positions.
    pub fn measurements(&self) -> [f64; NUM_JOINTS] {
        let mut values = [0.0; NUM_JOINTS];

        for m in self.meas.iter() {
            values[m.joint().index()] = m.value();
        }

        values
    }

    /// Command every valve and write the outputs.
    ///
    /// A failed write is warned about and the remaining valves are still written.
    pub fn actuate(&mut self, cmd: &CmdVector) {
        for s in self.servos.iter_mut() {
            s.set_command(cmd.get(s.joint()));

            if let Err(e) = s.apply() {
                warn!("Could not actuate the {} valve: {}", s.joint(), e);
            }
        }
    }

    /// Return every valve to neutral.
    pub fn make_safe(&mut self) {
        self.actuate(&CmdVector::default());
    }

    /// Demanded duty cycle of each valve, in percent.
    pub fn duty_cycles(&self) -> [f64; NUM_JOINTS] {
        let mut duty = [0.0; NUM_JOINTS];

        for s in self.servos.iter() {
            duty[s.joint().index()] = s.duty_set();
        }

        duty
    }

    /// Stop every PWM output.
    ///
    /// All outputs are stopped even if some fail, the first failure is returned.
    pub fn close(self) -> Result<(), ExcavatorError> {
        let mut result = Ok(());

        for s in self.servos.into_iter() {
            let joint = s.joint();
            if let Err(e) = s.close() {
                warn!("Could not stop the {} valve output: {}", joint, e);
                if result.is_ok() {
                    result = Err(ExcavatorError::ServoError(joint, e));
                }
            }
        }

        info!("All valve outputs stopped");

        result
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn check_joints<I>(joints: I, what: &'static str) -> Result<(), ExcavatorError>
where
    I: Iterator<Item = JointId>
{
    let mut seen = [false; NUM_JOINTS];

    for j in joints {
        if seen[j.index()] {
            return Err(ExcavatorError::DuplicateJoint(j, what))
        }
        seen[j.index()] = true;
    }

    match JointId::ALL.iter().find(|j| !seen[j.index()]) {
        Some(j) => Err(ExcavatorError::MissingJoint(*j, what)),
        None => Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        data_logger::LogMode,
        data_store::DataStore,
        params::test::sim_params,
        servo_ctrl::ServoParams,
    };

    struct Rig {
        exc: Excavator,
        pwms: Vec<SimPwm>,
        adcs: Vec<SimAdc>,
        enc: SimEncoder,
    }

    /// Build the excavator from the rig parameters, keeping handles on the simulated devices.
    fn rig() -> Rig {
        let params = sim_params();

        let mut servos = Vec::new();
        let mut meas = Vec::new();
        let mut pwms = Vec::new();
        let mut adcs = Vec::new();
        let enc = SimEncoder::new(500);

        // Reverse order, the excavator sorts them
        for jp in params.joints.iter().rev() {
            let pwm = SimPwm::new();
            servos.push(Servo::new(Box::new(pwm.clone()), &jp.servo).unwrap());
            pwms.push(pwm);

            let joint = jp.servo.joint;
            match joint {
                JointId::Swing => meas.push(
                    MeasChannel::encoder(joint, Box::new(enc.clone())).unwrap()
                ),
                _ => {
                    let adc = SimAdc::new(0.0);
                    meas.push(MeasChannel::analog(joint, Box::new(adc.clone()), None).unwrap());
                    adcs.push(adc);
                }
            }
        }

        // Back into joint order
        pwms.reverse();
        adcs.reverse();

        Rig {
            exc: Excavator::from_parts(servos, meas).unwrap(),
            pwms,
            adcs,
            enc,
        }
    }

    #[test]
    fn test_new_sim() {
        let exc = Excavator::new(&sim_params()).unwrap();

        // Boom reads axis 2, stick 3, bucket 0, swing 1
        let map = exc.axis_map().unwrap();
        assert_eq!(map, AxisMap::new([2, 3, 0, 1]).unwrap());

        exc.close().unwrap();
    }

    #[test]
    fn test_new_monitor() {
        let mut params = sim_params();
        params.mode = LogMode::Monitor;

        let mut exc = Excavator::new(&params).unwrap();
        assert!(!exc.has_valves());
        assert!(matches!(exc.axis_map(), Err(ExcavatorError::NoValves)));

        // Nothing to drive, the sensors still read
        exc.actuate(&CmdVector([1.0; NUM_JOINTS]));
        assert_eq!(exc.duty_cycles(), [0.0; NUM_JOINTS]);
        assert_eq!(exc.update_measurements(), [0.0; NUM_JOINTS]);

        exc.close().unwrap();
    }

    #[test]
    fn test_measurement_only_parts() {
        let enc = SimEncoder::new(0);
        let mut meas = vec![MeasChannel::encoder(JointId::Swing, Box::new(enc.clone())).unwrap()];
        for joint in &[JointId::Boom, JointId::Stick, JointId::Bucket] {
            meas.push(MeasChannel::analog(*joint, Box::new(SimAdc::new(0.0)), None).unwrap());
        }

        let mut exc = Excavator::from_parts(vec![], meas).unwrap();
        assert!(!exc.has_valves());

        enc.advance(3200);
        let m = exc.update_measurements();
        assert!((m[3] - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_demand_holds_valves() {
        let mut rig = rig();
        let map = rig.exc.axis_map().unwrap();
        let mut ds = DataStore::default();

        ds.apply_demand(Some("[0.5, -0.6, 0.7, -0.8]"), &map).unwrap();
        rig.exc.actuate(&ds.command_for(LogMode::Manual));

        let cmd = ds.operator_cmd;
        let duty: Vec<Option<f64>> = rig.pwms.iter().map(|p| p.state().duty_pct).collect();
        assert_ne!(cmd, CmdVector::default());
        assert_ne!(rig.exc.duty_cycles(), Excavator::new(&sim_params()).unwrap().duty_cycles());

        // The bad datagram is dropped and the valves keep the last good command
        assert!(ds.apply_demand(Some("[abc, 0.1]"), &map).is_err());
        rig.exc.actuate(&ds.command_for(LogMode::Manual));

        assert_eq!(ds.operator_cmd, cmd);
        for (pwm, d) in rig.pwms.iter().zip(duty.iter()) {
            assert_eq!(pwm.state().duty_pct, *d);
        }

        // As do cycles where nothing arrives
        ds.apply_demand(None, &map).unwrap();
        rig.exc.actuate(&ds.command_for(LogMode::Manual));

        assert_eq!(ds.operator_cmd, cmd);
        for (pwm, d) in rig.pwms.iter().zip(duty.iter()) {
            assert_eq!(pwm.state().duty_pct, *d);
        }
    }

    #[test]
    fn test_missing_joint() {
        let servo_params = ServoParams {
            joint: JointId::Boom,
            duty_min_pct: 5.0,
            duty_max_pct: 10.0,
            js_index: 0,
        };
        let servo = Servo::new(Box::new(SimPwm::new()), &servo_params).unwrap();

        assert!(matches!(
            Excavator::from_parts(vec![servo], vec![]),
            Err(ExcavatorError::MissingJoint(JointId::Stick, "servo"))
        ));
    }

    #[test]
    fn test_actuate() {
        let mut rig = rig();

        rig.exc.actuate(&CmdVector([2.0, -2.0, 0.0, 0.5]));
        let duty = rig.exc.duty_cycles();

        assert_eq!(duty[0], 10.01);
        assert_eq!(duty[1], 4.929);
        assert_eq!(rig.pwms[0].state().duty_pct, Some(10.01));
        assert_eq!(rig.pwms[1].state().duty_pct, Some(4.929));

        let bucket_mid = 5.198 + 0.5 * (10.03 - 5.198);
        assert_eq!(rig.pwms[2].state().duty_pct, Some(bucket_mid));

        rig.exc.make_safe();
        let params = sim_params();
        for (pwm, jp) in rig.pwms.iter().zip(params.joints.iter()) {
            let mid = jp.servo.duty_min_pct
                + 0.5 * (jp.servo.duty_max_pct - jp.servo.duty_min_pct);
            let state = pwm.state();
            assert_eq!(state.writes.len(), 2);
            assert_eq!(state.writes[1], mid);
        }
    }

    #[test]
    fn test_measurements() {
        let mut rig = rig();

        assert_eq!(rig.exc.measurements(), [0.0; NUM_JOINTS]);

        rig.adcs[0].set(717.0);
        rig.adcs[2].set(173.0);
        rig.enc.advance(1600);

        let m = rig.exc.update_measurements();
        assert!((m[0] - 5.07).abs() < 1e-12);
        assert_eq!(m[2], 0.0);
        assert!((m[3] - std::f64::consts::PI / 2.0).abs() < 1e-12);

        // A failing sensor holds its value and doesn't stop the others
        rig.adcs[0].fail(true);
        rig.adcs[1].set(707.0);
        let m = rig.exc.update_measurements();
        assert!((m[0] - 5.07).abs() < 1e-12);
        assert!((m[1] - 3.84).abs() < 1e-12);
    }

    #[test]
    fn test_close_stops_outputs() {
        let rig = rig();
        let pwms = rig.pwms.clone();

        rig.exc.close().unwrap();
        for pwm in pwms.iter() {
            assert!(!pwm.state().running);
            assert_eq!(pwm.state().stops, 1);
        }
    }

    #[test]
    fn test_drop_stops_outputs() {
        let pwms = {
            let rig = rig();
            rig.pwms.clone()
        };

        for pwm in pwms.iter() {
            assert!(!pwm.state().running);
        }
    }
}
