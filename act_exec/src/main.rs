//! # Actuator Control Executable
//!
//! This executable drives a single linear actuator:
//! - Commanding: walks the configured position sequence, one position per commanding interval
//! - Sensing: reads back and reports the actuator's position every sensing interval
//!
//! Both run cooperatively on the main thread until the optional run duration has elapsed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::sync::Arc;
use log::info;
use color_eyre::{Result, eyre::{WrapErr, eyre}};
use structopt::StructOpt;

// Internal
use act_lib::{
    actuator::{Actuator, sim::SimPlant},
    calib::Calibration,
    params::ActExecParams,
    sched::{CommandingActivity, Scheduler, SensingActivity, SystemClock},
    telemetry::LogSink,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::{millis_to_duration, seconds_to_duration},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "act_exec", about = "Linear actuator control executable")]
struct Args {
    /// Parameter file, relative to the `params` directory of the software root.
    #[structopt(short, long, default_value = "act_exec.toml")]
    params: String,

    /// Stop after this many seconds, overriding the parameter file.
    #[structopt(short, long)]
    duration_s: Option<f64>,

    /// Log level of the sensing and commanding records, `warn` keeps only faults.
    #[structopt(long, default_value = "info")]
    telemetry_level: LevelFilter,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "act_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(
        LevelFilter::Debug,
        &[("act_lib::telemetry", args.telemetry_level)],
        &session
    )
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Actuator Control Executable\n");
    info!("Running on: {}", host::platform());
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let mut params: ActExecParams = util::params::load(&args.params)
        .wrap_err("Could not load the executable parameters")?;

    if args.duration_s.is_some() {
        params.run_duration_s = args.duration_s;
    }

    params.are_valid().wrap_err("Invalid executable parameters")?;

    let calib = Arc::new(
        Calibration::from_params(&params).wrap_err("Invalid actuator calibration")?
    );

    info!("Parameters loaded");
    info!("    Calibration: {:?}", calib);
    info!("    Sensor wiring: {:?}", params.sensor_wiring);

    // ---- ACTUATOR INITIALISATION ----

    // Peripheral setup is board specific, the executable drives the simulated actuator
    let plant = SimPlant::new(calib.clone(), params.sensor_wiring);
    let actuator = Actuator::new(calib, params.sensor_wiring, plant.pwm(), plant.adc());

    info!("Actuator initialised");

    // ---- SCHEDULER INITIALISATION ----

    let sensing_interval = millis_to_duration(params.sensing_interval_ms)
        .ok_or_else(|| eyre!("Invalid sensing interval"))?;
    let commanding_interval = millis_to_duration(params.commanding_interval_ms)
        .ok_or_else(|| eyre!("Invalid commanding interval"))?;

    let (command_channel, sense_channel) = actuator.split();

    let mut scheduler = Scheduler::new(SystemClock::new());

    scheduler.add(Box::new(
        SensingActivity::new(sense_channel, LogSink, sensing_interval)
            .wrap_err("Failed to create the sensing activity")?
    ))?;
    scheduler.add(Box::new(
        CommandingActivity::new(
            command_channel,
            LogSink,
            commanding_interval,
            params.position_sequence.clone()
        ).wrap_err("Failed to create the commanding activity")?
    ))?;

    // ---- MAIN LOOP ----

    let report = match params.run_duration_s {
        Some(d) => {
            let end = seconds_to_duration(d)
                .ok_or_else(|| eyre!("Invalid run duration: {} s", d))?;

            info!("Initialisation complete, running for {} s\n", d);
            scheduler.run_until(end)
        },
        None => {
            info!("Initialisation complete, running until stopped\n");
            scheduler.run()
        }
    };

    info!("Run complete: {:#?}", report);

    Ok(())
}
