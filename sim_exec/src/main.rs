//! Main simulator executable entry point.
//!
//! # Architecture
//!
//! The executable replaces the interactive front end with a scenario script:
//!
//!     - Initialise the session, logging and parameters
//!     - Main loop:
//!         - Execute the script commands due at the current simulation time
//!         - Tick the simulation
//!         - Archive the tick report
//!     - Save the recorded run
//!
//! The loop ends once the script is finished and the robot is not moving, or
//! when the tick limit is reached.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::path::PathBuf;
use structopt::StructOpt;
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use sim_lib::{
    cmd::{ManualControls, SimCmd},
    params::SimParams,
    path_ctrl::PathCtrlMode,
    sim::Simulation
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    session::Session,
    script_interpreter::{ScriptInterpreter, PendingCmds}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic robot simulator
#[derive(Debug, StructOpt)]
#[structopt(name = "sim_exec")]
struct Opt {
    /// Scenario script to execute
    #[structopt(short, long, parse(from_os_str))]
    script: PathBuf,

    /// Parameter file, relative to the parameters directory
    #[structopt(short, long, default_value = "sim.toml")]
    params: String,

    /// Length of one tick
    #[structopt(long, default_value = "1.0")]
    dt: f64,

    /// Stop after this many ticks even if the run isn't complete
    #[structopt(long, default_value = "1000000")]
    max_ticks: u64
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "sim_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Robot Simulator Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    if !(opt.dt.is_finite() && opt.dt > 0.0) {
        return Err(eyre!("The tick length must be positive, got {}", opt.dt))
    }

    // ---- LOAD PARAMETERS ----

    let params: SimParams = util::params::load(&opt.params)
        .wrap_err("Could not load simulation params")?;

    info!("Simulation parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", opt.script);

    let mut si: ScriptInterpreter<SimCmd> = ScriptInterpreter::new(&opt.script)
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} commands\n",
        si.get_duration(),
        si.get_num_cmds()
    );

    // ---- INITIALISE SIMULATION ----

    let mut sim = Simulation::new(params)
        .wrap_err("Failed to create the simulation")?;
    sim.init_archive(&session)
        .wrap_err("Failed to initialise the simulation archive")?;

    let mut controls = ManualControls::default();
    let mut end_of_script = false;

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // ---- SCRIPT PROCESSING ----

        if !end_of_script {
            match si.get_pending(sim.sim_time()) {
                PendingCmds::None => (),
                PendingCmds::Some(cmds) => {
                    for cmd in cmds.iter() {
                        if let Err(e) = cmd.exec(&mut sim, &mut controls) {
                            warn!("Could not execute {:?}: {}", cmd, e);
                        }
                    }
                },
                PendingCmds::EndOfScript => {
                    info!("End of script reached");
                    end_of_script = true;
                }
            }
        }

        // ---- SIMULATION ----

        let (speed, rotation) = controls.get();

        let report = sim.tick(opt.dt, speed, rotation)
            .wrap_err("Simulation tick failed")?;

        if report.arrived {
            info!(
                "Arrived after {} ticks ({:.02} s of simulation time)",
                report.tick, report.sim_time_s
            );
        }

        // ---- WRITE ARCHIVES ----

        sim.write().wrap_err("Failed to write the simulation archive")?;

        // ---- EXIT CONDITIONS ----

        // Nothing can resume a paused run once the script is over
        if end_of_script && sim.mode() != PathCtrlMode::Moving {
            info!("Script finished and the robot is not moving, stopping");
            break
        }

        // Nothing can change the speed of a run once the script is over
        if end_of_script && sim.is_stalled() {
            warn!("Script finished with the run stalled at zero speed, stopping");
            break
        }

        if sim.tick_count() >= opt.max_ticks {
            warn!("Tick limit of {} reached, stopping", opt.max_ticks);
            break
        }
    }

    // ---- SHUTDOWN ----

    let record = sim.run_record();
    info!(
        "Run recorded {} trajectory points and {} point cloud points",
        record.trajectory.len(),
        record.point_cloud.len()
    );

    session.save("run.json", &record)
        .wrap_err("Failed to save the run")?;

    info!("End of execution");

    Ok(())
}
