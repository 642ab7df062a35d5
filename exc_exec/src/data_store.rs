//! # Data Store

use comms_if::eqpt::exc::NUM_JOINTS;
use log::info;

use crate::{
    auto_ctrl::ControllerOutput,
    blend_ctrl::{self, MotionEstimate},
    data_logger::LogMode,
    js_cmd::{self, AxisMap, CmdVector, ParseError},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Seconds since the start of the session at the start of this cycle
    pub time_s: f64,

    /// True once the first valid joystick command has been parsed
    pub cmd_received: bool,

    // Operator
    /// The last valid operator command, held until a new one is parsed
    pub operator_cmd: CmdVector,

    // Measurements
    /// Joint positions, centimetres for the cylinders and radians for the swing
    pub meas: [f64; NUM_JOINTS],

    // Autonomous controller
    pub ctrl_output: ControllerOutput,

    // BlendCtrl
    pub blend_ctrl: blend_ctrl::BlendCtrl,
    pub blend_ctrl_input: blend_ctrl::InputData,
    pub blend_ctrl_output: CmdVector,
    pub blend_ctrl_status_rpt: blend_ctrl::StatusReport,

    /// The command actually sent to the valves this cycle
    pub actuated_cmd: CmdVector,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive cycles without a joystick datagram
    pub num_consec_empty_cycles: u64,

    /// Number of joystick datagrams which could not be parsed
    pub num_parse_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_s = (cycle_frequency_hz.round() as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        self.ctrl_output = ControllerOutput::default();
        self.blend_ctrl_input = blend_ctrl::InputData::default();
        self.blend_ctrl_output = CmdVector::default();
        self.blend_ctrl_status_rpt = blend_ctrl::StatusReport::default();

        self.time_s = util::session::get_elapsed_seconds();
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }

    /// Take this cycle's joystick datagram, if one arrived.
    ///
    /// A valid datagram replaces the operator command. A malformed one is counted and returned as
    /// an error, and the previous operator command is kept, as it is when nothing arrived.
    pub fn apply_demand(&mut self, msg: Option<&str>, map: &AxisMap) -> Result<(), ParseError> {
        let msg = match msg {
            Some(m) => m,
            None => {
                self.num_consec_empty_cycles += 1;
                return Ok(())
            }
        };

        self.num_consec_empty_cycles = 0;

        match js_cmd::parse(msg, map) {
            Ok(cmd) => {
                if !self.cmd_received {
                    info!("First joystick command received");
                    self.cmd_received = true;
                }
                self.operator_cmd = cmd;
                Ok(())
            },
            Err(e) => {
                self.num_parse_errors += 1;
                Err(e)
            }
        }
    }

    /// The command which drives the valves in the given mode.
    ///
    /// Neutral in monitor mode.
    pub fn command_for(&self, mode: LogMode) -> CmdVector {
        match mode {
            LogMode::Manual => self.operator_cmd,
            LogMode::Autonomous => self.ctrl_output.cmd,
            LogMode::Blended => self.blend_ctrl_output,
            LogMode::Monitor => CmdVector::default(),
        }
    }

    /// Assemble this cycle's data log row for the given mode, in the order of the mode's header.
    pub fn log_record(&self, mode: LogMode) -> Vec<f64> {
        let mut record = Vec::with_capacity(mode.header().len());
        record.push(self.time_s);

        match mode {
            LogMode::Manual => {
                record.extend_from_slice(&self.operator_cmd.0);
                record.extend_from_slice(&self.meas);
            },
            LogMode::Autonomous => {
                record.extend_from_slice(&self.meas);
                record.extend_from_slice(&self.ctrl_output.cmd.0);
                record.extend_from_slice(&self.ctrl_output.error);
            },
            LogMode::Blended => {
                let MotionEstimate { class, confidence, .. } =
                    self.blend_ctrl_status_rpt.estimate;

                record.extend_from_slice(&self.operator_cmd.0);
                record.extend_from_slice(&self.ctrl_output.cmd.0);
                record.extend_from_slice(&self.blend_ctrl_output.0);
                record.extend_from_slice(&self.meas);
                record.push(class as f64);
                record.push(confidence);
            },
            LogMode::Monitor => {
                record.extend_from_slice(&self.meas);
            }
        }

        record
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn populated() -> DataStore {
        let mut ds = DataStore::default();
        ds.time_s = 1.5;
        ds.operator_cmd = CmdVector([0.1, 0.2, 0.3, 0.4]);
        ds.meas = [10.0, 11.0, 12.0, 0.5];
        ds.ctrl_output = ControllerOutput {
            cmd: CmdVector([-0.1, -0.2, -0.3, -0.4]),
            error: [1.0, 2.0, 3.0, 4.0],
        };
        ds.blend_ctrl_output = CmdVector([0.0; NUM_JOINTS]);
        ds.blend_ctrl_status_rpt.estimate = MotionEstimate {
            alpha: 0.5,
            class: 2,
            confidence: 0.75,
        };
        ds
    }

    #[test]
    fn test_record_arity_matches_header() {
        let ds = populated();

        for mode in &[LogMode::Manual, LogMode::Autonomous, LogMode::Blended, LogMode::Monitor] {
            assert_eq!(ds.log_record(*mode).len(), mode.header().len());
        }
    }

    #[test]
    fn test_record_order() {
        let ds = populated();

        assert_eq!(
            ds.log_record(LogMode::Manual),
            vec![1.5, 0.1, 0.2, 0.3, 0.4, 10.0, 11.0, 12.0, 0.5]
        );

        let auto = ds.log_record(LogMode::Autonomous);
        assert_eq!(&auto[1..5], &[10.0, 11.0, 12.0, 0.5]);
        assert_eq!(&auto[9..13], &[1.0, 2.0, 3.0, 4.0]);

        let blended = ds.log_record(LogMode::Blended);
        assert_eq!(&blended[5..9], &[-0.1, -0.2, -0.3, -0.4]);
        assert_eq!(&blended[17..], &[2.0, 0.75]);

        assert_eq!(
            ds.log_record(LogMode::Monitor),
            vec![1.5, 10.0, 11.0, 12.0, 0.5]
        );
    }

    #[test]
    fn test_apply_demand() {
        let map = AxisMap::identity();
        let mut ds = DataStore::default();

        // Nothing received yet, the operator command stays neutral
        ds.apply_demand(None, &map).unwrap();
        ds.apply_demand(None, &map).unwrap();
        assert_eq!(ds.num_consec_empty_cycles, 2);
        assert!(!ds.cmd_received);
        assert_eq!(ds.operator_cmd, CmdVector::default());

        ds.apply_demand(Some("[0.5, -0.5, 0.25, 0.05]"), &map).unwrap();
        let cmd = CmdVector([-0.5, 0.5, 0.25, 0.0]);
        assert_eq!(ds.operator_cmd, cmd);
        assert_eq!(ds.num_consec_empty_cycles, 0);
        assert!(ds.cmd_received);

        // Malformed datagrams are counted and the command is held
        assert!(matches!(
            ds.apply_demand(Some("[abc, 0.1]"), &map),
            Err(ParseError::Malformed(_))
        ));
        assert!(ds.apply_demand(Some("[0.1, 0.2, 0.3]"), &map).is_err());
        assert_eq!(ds.num_parse_errors, 2);
        assert_eq!(ds.operator_cmd, cmd);

        ds.apply_demand(None, &map).unwrap();
        assert_eq!(ds.operator_cmd, cmd);
        assert_eq!(ds.num_consec_empty_cycles, 1);
    }

    #[test]
    fn test_command_for_mode() {
        let ds = populated();

        assert_eq!(ds.command_for(LogMode::Manual), ds.operator_cmd);
        assert_eq!(ds.command_for(LogMode::Autonomous), ds.ctrl_output.cmd);
        assert_eq!(ds.command_for(LogMode::Blended), ds.blend_ctrl_output);
        assert_eq!(ds.command_for(LogMode::Monitor), CmdVector::default());
    }
}
