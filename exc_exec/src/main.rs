//! # Excavator Control Executable
//!
//! This executable runs on the excavator's controller board. Each cycle it:
//!
//!     - Receives the freshest joystick datagram and parses it into joint commands
//!     - Reads the joint sensors
//!     - Runs the autonomous controller and blends its output with the operator's commands
//!     - Drives the valves with the command selected by the operating mode
//!     - Logs the cycle to the data file
//!
//! In monitor mode the valves are never energised and only the sensors are read and logged.
//!
//! The loop runs until Ctrl-C is pressed, after which the valves are returned to neutral and every
//! PWM output is stopped.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use comms_if::net::NetParams;
use log::{debug, info, warn};
use std::{
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    thread,
    time::Instant,
};
use color_eyre::{Result, eyre::{WrapErr, eyre}};

// Internal
use exc_lib::{
    auto_ctrl::{Controller, NullController},
    blend_ctrl,
    data_logger::{self, DataLogger, LogMode},
    data_store::DataStore,
    excavator::Excavator,
    js_server::JsServer,
    params::ExcExecParams,
};
use util::{
    host,
    module::State,
    logger::logger_init,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of consecutive cycles without a joystick datagram after which a warning is given.
const EMPTY_CYCLES_WARN_LIMIT: u64 = 40;

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "exc_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Parameters come first as they set the log levels
    let params: ExcExecParams = util::params::load("exc_exec.toml")
        .wrap_err("Could not load exec params")?;

    // Initialise logger
    logger_init(&params.log, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Excavator Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load("net.toml")
        .wrap_err("Could not load net params")?;

    params.validate().wrap_err("Invalid exec params")?;

    // Keep a copy of what this session was run with
    session.save_json("exc_exec_params.json", &params)
        .wrap_err("Could not save the exec params")?;
    session.save_json("net_params.json", &net_params)
        .wrap_err("Could not save the net params")?;

    info!("Parameters loaded, running in {:?} mode", params.mode);

    let cycle_period = params.cycle_period()
        .wrap_err("Invalid cycle period")?;
    let cycle_frequency_hz = 1.0 / cycle_period.as_secs_f64();

    // ---- STOP HANDLING ----

    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
            .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    let mut excavator = Excavator::new(&params)
        .wrap_err("Failed to initialise the excavator hardware")?;
    info!("Excavator initialised");

    ds.blend_ctrl.init(blend_ctrl::InitData {
        mode: params.blend,
        provider: None,
    }).wrap_err("Failed to initialise BlendCtrl")?;
    info!("BlendCtrl init complete ({:?})", params.blend);

    let mut controller = NullController;

    info!("Module initialisation complete\n");

    // ---- INITIALISE DATA LOG ----

    let data_path = session.data_root.join(data_logger::data_file_name(
        &params.data_file_stem,
        &chrono::Local::now()
    ));
    let mut logger = DataLogger::open(params.mode, &data_path);

    // ---- INITIALISE NETWORK ----

    // Nothing to command in monitor mode, so no joystick server either
    let mut joystick = if excavator.has_valves() {
        let axis_map = excavator.axis_map()
            .wrap_err("Failed to build the joystick axis map")?;
        debug!("Joystick axis map: {:?}", axis_map);

        let server = JsServer::new(&net_params)
            .wrap_err("Failed to initialise the joystick server")?;
        info!("Joystick server listening on {}", net_params.js_bind_endpoint);

        Some((server, axis_map))
    }
    else {
        info!("Monitoring only, joystick commands are not received");
        None
    };

    // ---- MAIN LOOP ----

    match joystick {
        Some(_) => info!("Initialisation complete, waiting for joystick commands\n"),
        None => info!("Initialisation complete\n")
    }

    while running.load(Ordering::SeqCst) {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_frequency_hz);

        // ---- OPERATOR INPUT ----

        if let Some((ref mut server, ref axis_map)) = joystick {
            let msg = server.get_demands();

            // On error the previous command is held
            if let Err(e) = ds.apply_demand(msg.as_deref(), axis_map) {
                warn!("{}", e);
            }

            if ds.num_consec_empty_cycles == EMPTY_CYCLES_WARN_LIMIT && ds.cmd_received {
                warn!(
                    "No joystick datagram for {} cycles, holding the last command",
                    EMPTY_CYCLES_WARN_LIMIT
                );
            }
        }

        // ---- MEASUREMENT ----

        ds.meas = excavator.update_measurements();

        // ---- CONTROL ALGORITHM PROCESSING ----

        if params.mode.runs_controller() {
            ds.ctrl_output = controller.output(&ds.operator_cmd, &ds.meas);
        }

        if params.mode == LogMode::Blended {
            ds.blend_ctrl_input = blend_ctrl::InputData {
                operator: ds.operator_cmd,
                controller: ds.ctrl_output.cmd,
                meas: ds.meas,
            };

            match ds.blend_ctrl.proc(&ds.blend_ctrl_input) {
                Ok((o, r)) => {
                    ds.blend_ctrl_output = o;
                    ds.blend_ctrl_status_rpt = r;
                },
                Err(e) => return Err(eyre!("Error during BlendCtrl processing: {}", e))
            }
        }

        // ---- ACTUATION ----

        if params.mode.drives_valves() {
            ds.actuated_cmd = ds.command_for(params.mode);
            excavator.actuate(&ds.actuated_cmd);
        }

        // ---- DATA LOGGING ----

        logger.log(&ds.log_record(params.mode));

        if ds.is_1_hz_cycle {
            debug!(
                "cmd = {:?}, meas = {:?}, duty = {:?}",
                ds.actuated_cmd.0,
                ds.meas,
                excavator.duty_cycles()
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    info!("Stop requested after {} cycles, shutting down", ds.num_cycles);

    if ds.num_parse_errors > 0 {
        warn!("{} joystick datagrams could not be parsed", ds.num_parse_errors);
    }

    excavator.make_safe();

    if logger.is_enabled() {
        info!("Data log written to {:?}", logger.path());
    }
    if let Err(e) = logger.close() {
        warn!("{}", e);
    }

    excavator.close().wrap_err("Failed to stop the valve outputs")?;

    info!("End of execution");

    Ok(())
}
