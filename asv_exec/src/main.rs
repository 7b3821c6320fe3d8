//! Main vessel-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and all modules
//!     - Spawn the position refresh thread (GNSS fixes into the shared
//!       vessel state)
//!     - Main control loop:
//!         - Bus telemetry acquisition
//!         - Guidance processing
//!         - Actuator demand dispatch
//!
//! The loop runs until the final waypoint is reached. This executable runs
//! against the simulated equipment, the live GNSS and bus transports plug
//! in behind the same traits.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use asv_lib::{
    guidance::Guidance,
    mission::MissionParams,
    sim::{self, SimBus, SimGnss},
    vessel::{HullParams, VesselState},
};
use comms_if::bus::{BusConnector, KinTm};
use comms_if::gnss::GnssSource;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one control cycle.
const CYCLE_PERIOD: Duration = Duration::from_millis(200);

/// Period of the position refresh thread.
const GNSS_PERIOD: Duration = Duration::from_millis(100);

/// Maximum time a single fix acquisition may take, kept inside the refresh
/// period so a slow receiver cannot stall the thread.
const GNSS_TIMEOUT: Duration = Duration::from_millis(80);

/// Number of consecutive missed fixes before the signal counts as lost.
const GNSS_MISS_LIMIT: u32 = 5;

/// Ground speed of the scripted receiver track in meters/second.
const SIM_TRACK_SPEED_MS: f64 = 2.0;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("asv_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    info!("ASV Guidance Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mission: MissionParams =
        util::params::load("mission.toml").wrap_err("Could not load mission params")?;
    let hull: HullParams = util::params::load("hull.toml").wrap_err("Could not load hull params")?;

    info!(
        "Mission loaded: {} waypoints under UTM zone {}, hull \"{}\"",
        mission.waypoints.len(),
        mission.zone.number(),
        hull.name
    );

    // ---- INITIALISE EQUIPMENT ----

    // Scripted receiver which traverses the mission from the berth
    let mut track_points = vec![mission.start_point()];
    track_points.extend(mission.waypoint_points());

    let mut gnss = SimGnss::from_track(sim::track_along(
        &track_points,
        SIM_TRACK_SPEED_MS,
        GNSS_PERIOD.as_secs_f64(),
    ));

    let mut bus = SimBus::default();

    // ---- BUILD THE VESSEL STATE ----

    let initial_fix = gnss
        .get_fix(GNSS_TIMEOUT)
        .ok_or_else(|| eyre!("No initial GNSS fix, cannot start the mission"))?;

    info!(
        "Initial fix: ({:.6}, {:.6})",
        initial_fix.lat_deg, initial_fix.lon_deg
    );

    let geofence = mission
        .build_geofence()
        .wrap_err("Could not build the mission geofence")?;

    let start = mission
        .start_point()
        .with_coordinates(initial_fix.lat_deg, initial_fix.lon_deg);
    let route = mission
        .build_route(start)
        .wrap_err("Could not build the mission route")?;

    let vessel = Arc::new(
        VesselState::new(&initial_fix, mission.zone, geofence, route, hull)
            .wrap_err("Could not build the vessel state")?,
    );

    // ---- INITIALISE MODULES ----

    let mut guidance = Guidance::default();
    guidance
        .init("guidance.toml", &session)
        .wrap_err("Failed to initialise the guidance module")?;

    // ---- POSITION REFRESH THREAD ----

    let stop = Arc::new(AtomicBool::new(false));

    let refresh_stop = stop.clone();
    let refresh_vessel = vessel.clone();
    let refresh_handle = thread::spawn(move || {
        let mut consecutive_misses = 0u32;

        while !refresh_stop.load(Ordering::Relaxed) {
            match gnss.get_fix(GNSS_TIMEOUT) {
                Some(fix) => {
                    refresh_vessel.apply_fix(&fix);
                    consecutive_misses = 0;
                }
                None => {
                    consecutive_misses += 1;
                    if consecutive_misses == GNSS_MISS_LIMIT {
                        warn!(
                            "No GNSS fix for {} consecutive attempts, signal lost",
                            consecutive_misses
                        );
                    }
                }
            }

            thread::sleep(GNSS_PERIOD);
        }
    });

    // ---- MAIN CONTROL LOOP ----

    info!("Entering the control loop");

    // A control loop error must still stop and join the refresh thread,
    // so it is held here rather than returned immediately.
    let loop_result = control_loop(&mut bus, &mut guidance, &vessel);

    // ---- SHUTDOWN ----

    stop.store(true, Ordering::Relaxed);
    refresh_handle
        .join()
        .map_err(|_| eyre!("The position refresh thread panicked"))?;

    loop_result?;

    info!("ASV executable finished");

    Ok(())
}

/// Run the cyclic control loop until the mission completes or a cycle
/// fails.
fn control_loop(
    bus: &mut impl BusConnector,
    guidance: &mut Guidance,
    vessel: &Arc<VesselState>,
) -> Result<(), Report> {
    loop {
        let cycle_start = Instant::now();

        // Bus telemetry acquisition
        let frames = bus
            .poll_telemetry()
            .wrap_err("Bus telemetry poll failed")?;
        if !frames.is_empty() {
            match KinTm::from_frames(&frames) {
                Ok(tm) => vessel.update_from_bus(&tm),
                Err(e) => warn!("Dropping a bad telemetry burst: {}", e),
            }
        }

        // Guidance processing
        let (dems, report) = guidance
            .proc(vessel)
            .wrap_err("Guidance processing failed")?;

        // Actuator demand dispatch
        bus.send_dems(&dems)
            .wrap_err("Could not send the actuator demands")?;

        if report.mission_complete {
            info!("Mission complete after {:.1} s", report.elapsed_s);
            return Ok(());
        }

        // Sleep out the remainder of the cycle
        let elapsed = cycle_start.elapsed();
        if elapsed < CYCLE_PERIOD {
            thread::sleep(CYCLE_PERIOD - elapsed);
        }
        else {
            warn!("Control cycle overran: {:?}", elapsed);
        }
    }
}
