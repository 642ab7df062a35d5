//! # Joystick Sender Executable
//!
//! Runs on the operator's station. Reads the raw axes of the two joysticks, puts them into wire
//! order according to which joystick is primary, and streams them to the excavator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Sources of raw joystick axes.
mod axis_source;

/// Sends axes to the excavator.
mod js_client;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use comms_if::{eqpt::exc::AxisOrder, net::NetParams};
use log::{debug, info, warn};
use std::{
    path::PathBuf,
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    thread,
    time::Instant,
};
use structopt::StructOpt;
use color_eyre::{Result, eyre::WrapErr};

// Internal
use axis_source::{AxisSource, ReplaySource};
use js_client::JsClient;
use util::{
    logger::{logger_init, LevelFilter, LogLevels},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(StructOpt, Debug)]
#[structopt(name = "js_exec", about = "Streams joystick axes to the excavator")]
struct Opts {
    /// CSV recording of raw axes to replay, with columns tm0_x,tm0_y,tm1_x,tm1_y
    #[structopt(parse(from_os_str))]
    replay: PathBuf,

    /// Primary joystick, tm0 or tm1
    #[structopt(short, long, default_value = "tm0")]
    primary: AxisOrder,

    /// Send to this endpoint instead of the one in net.toml
    #[structopt(short, long)]
    target: Option<String>,

    /// Period between datagrams in seconds
    #[structopt(long, default_value = "0.05")]
    period_s: f64,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    let opts = Opts::from_args();
    let period = js_client::send_period(opts.period_s)
        .wrap_err("Invalid send period")?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "js_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger, every datagram goes to the file only
    logger_init(&LogLevels::new(LevelFilter::Info, LevelFilter::Debug), &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Joystick Sender Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load("net.toml")
        .wrap_err("Could not load net params")?;

    // ---- STOP HANDLING ----

    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
            .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- INITIALISE SOURCE AND CLIENT ----

    let mut source = ReplaySource::open(&opts.replay, opts.primary)
        .wrap_err("Failed to open the replay")?;
    info!("Replaying axes from {:?}", opts.replay);

    let client = JsClient::new(&net_params, opts.target.as_deref())
        .wrap_err("Failed to initialise the joystick client")?;
    info!("Sending to {}", client.target());

    let order = source.wait_primary()
        .wrap_err("Failed to select the primary joystick")?;
    info!("Primary joystick selected, axis order {:?}", order);

    let mut num_sent = 0u64;

    // ---- MAIN LOOP ----

    while running.load(Ordering::SeqCst) {
        let cycle_start_instant = Instant::now();

        let raw = match source.poll().wrap_err("Failed to read the joystick axes")? {
            Some(r) => r,
            None => {
                info!("End of replay reached, stopping");
                break
            }
        };

        let axes = order.apply(raw);

        match client.send(&axes) {
            Ok(()) => num_sent += 1,
            Err(e) => warn!("{}", e)
        }
        debug!("{:?}", axes.0);

        if let Some(d) = period.checked_sub(Instant::now() - cycle_start_instant) {
            thread::sleep(d);
        }
    }

    // ---- SHUTDOWN ----

    info!("Sent {} datagrams, end of execution", num_sent);

    Ok(())
}
