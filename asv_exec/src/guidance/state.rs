//! Guidance state and cyclic processing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{InitError, Mode, Params, ProcError};
use crate::vessel::VesselState;
use comms_if::bus::ActuatorDems;
use util::archive::Archiver;
use util::maths::{poly_val, wrap_pi};
use util::module::State;
use util::session::{self, Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The guidance module state.
#[derive(Default)]
pub struct Guidance {
    params: Option<Params>,

    mode: Mode,

    /// Accumulated cross-track error in meter-seconds.
    integral_ey: f64,

    /// Heading error from the previous cycle, used for the derivative term.
    prev_heading_error: f64,

    /// The ramped speed demand in meters/second.
    cmd_speed_ms: f64,

    report_archive: Archiver,
}

/// Status report produced each guidance cycle, archived as CSV.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Seconds since the session epoch.
    pub elapsed_s: f64,

    /// The controller mode this cycle ran in.
    pub mode: Mode,

    /// Index of the waypoint being steered towards.
    pub target_index: usize,

    /// Planar distance to the target waypoint in meters.
    pub distance_to_target_m: f64,

    /// Desired course in radians from true north.
    pub desired_course_rad: f64,

    /// Wrapped heading error in radians.
    pub heading_error_rad: f64,

    /// Heading error rate in radians/second.
    pub heading_error_rate_rads: f64,

    /// Cross-track error in meters, positive to starboard of the segment.
    pub cross_track_error_m: f64,

    /// Commanded speed in meters/second.
    pub cmd_speed_ms: f64,

    /// Rudder demand in degrees after clamping.
    pub rudder_angle_deg: f64,

    /// Propulsion demand in rpm.
    pub prop_rpm: u16,

    /// True once the final waypoint has been reached.
    pub mission_complete: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StatusReport {
    /// A report for a cycle in which the route was already exhausted.
    fn complete(mode: Mode) -> Self {
        Self {
            elapsed_s: session::get_elapsed_seconds(),
            mode,
            target_index: 0,
            distance_to_target_m: 0.0,
            desired_course_rad: 0.0,
            heading_error_rad: 0.0,
            heading_error_rate_rads: 0.0,
            cross_track_error_m: 0.0,
            cmd_speed_ms: 0.0,
            rudder_angle_deg: 0.0,
            prop_rpm: 0,
            mission_complete: true,
        }
    }
}

impl Guidance {
    /// Build a guidance state directly from a parameter set, without a
    /// session or archive. Used by tests and by the simulation harness.
    pub fn with_params(params: Params) -> Self {
        Self {
            params: Some(params),
            ..Default::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl State for Guidance {
    type InitData = &'static str;
    type InitError = InitError;

    type InputData = Arc<VesselState>;
    type OutputData = ActuatorDems;
    type StatusReport = StatusReport;
    type ProcError = ProcError;

    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), InitError> {
        self.params = Some(util::params::load(init_data)?);

        self.report_archive = Archiver::from_path(session, "guidance.csv")
            .map_err(|e| InitError::ArchiveError(e.to_string()))?;

        self.mode = Mode::Tracking;
        self.integral_ey = 0.0;
        self.prev_heading_error = 0.0;
        self.cmd_speed_ms = 0.0;

        info!("Guidance initialised from {:?}", init_data);

        Ok(())
    }

    fn proc(
        &mut self,
        vessel: &Self::InputData,
    ) -> Result<(ActuatorDems, StatusReport), ProcError> {
        let params = self.params.as_ref().ok_or(ProcError::NotInitialised)?;

        let snapshot = vessel.snapshot();

        // Resolve the active segment, advancing the cursor through any
        // waypoints already inside the arrival tolerance. Arrival always
        // drops the controller into turning mode with its error memory
        // cleared, the old segment's errors mean nothing on the new one.
        let (seg_start, target, distance_m) = loop {
            let (seg_start, target) = match vessel.current_segment() {
                Some(s) => s,
                None => {
                    let report = StatusReport::complete(self.mode);
                    self.archive(&report);
                    return Ok((ActuatorDems::neutral(), report));
                }
            };

            let distance_m = snapshot.position.planar_distance_to(&target)?;

            if distance_m < params.arrival_tolerance_m {
                info!(
                    "Waypoint {} reached ({:.1} m), turning onto the next segment",
                    vessel.target_waypoint_index(),
                    distance_m
                );
                self.mode = Mode::Turning;
                self.integral_ey = 0.0;
                self.prev_heading_error = 0.0;

                if !vessel.advance_waypoint() {
                    info!("Final waypoint reached, mission complete");
                    let report = StatusReport::complete(self.mode);
                    self.archive(&report);
                    return Ok((ActuatorDems::neutral(), report));
                }

                continue;
            }

            break (seg_start, target, distance_m);
        };

        // Desired course: the segment course while tracking, direct
        // line-of-sight to the target while turning onto a new segment.
        let desired_course_rad = match self.mode {
            Mode::Tracking => {
                let (north, east) = target.ned_offset_from(&seg_start)?;
                east.atan2(north)
            }
            Mode::Turning => {
                let (north, east) = target.ned_offset_from(&snapshot.position)?;
                east.atan2(north)
            }
        };

        // Heading error, positive when the vessel must turn to starboard
        let heading_error_rad = wrap_pi(desired_course_rad - snapshot.heading_psi);
        let heading_error_rate_rads =
            (heading_error_rad - self.prev_heading_error) / params.cycle_period_s;
        self.prev_heading_error = heading_error_rad;

        // Cross-track error relative to the segment line, positive when the
        // vessel sits to starboard of it
        let (north_p, east_p) = snapshot.position.ned_offset_from(&seg_start)?;
        let cross_track_error_m =
            desired_course_rad.cos() * east_p - desired_course_rad.sin() * north_p;

        let rudder_raw_deg = match self.mode {
            Mode::Turning => {
                self.cmd_speed_ms = (self.cmd_speed_ms - params.speed_step_ms)
                    .max(params.min_speed_ms);

                let rudder = params.heading_k_p * heading_error_rad
                    + params.heading_k_d * heading_error_rate_rads;

                if heading_error_rad.abs() < params.turn_exit_heading_error_rad
                    && heading_error_rate_rads.abs() < params.turn_exit_error_rate_rads
                {
                    info!("Aligned with the segment course, resuming tracking");
                    self.mode = Mode::Tracking;
                    self.integral_ey = 0.0;
                    self.prev_heading_error = 0.0;
                }

                rudder
            }
            Mode::Tracking => {
                self.cmd_speed_ms = (self.cmd_speed_ms + params.speed_step_ms)
                    .min(params.cruise_speed_ms);

                self.integral_ey += cross_track_error_m * params.cycle_period_s;

                // A starboard offset needs a port correction, so the
                // cross-track terms enter with a negative sign.
                params.heading_k_p * heading_error_rad
                    + params.heading_k_d * heading_error_rate_rads
                    - params.cross_track_k_p * cross_track_error_m
                    - params.cross_track_k_i * self.integral_ey
            }
        };

        let rudder_angle_deg = rudder_raw_deg
            .max(-params.rudder_limit_deg)
            .min(params.rudder_limit_deg);

        let prop_rpm = poly_val(&self.cmd_speed_ms, &params.speed_rpm_map_coeffs)
            .max(0.0)
            .round() as u16;

        let dems = ActuatorDems {
            rudder_angle_deg,
            prop_rpm,
        };

        let report = StatusReport {
            elapsed_s: session::get_elapsed_seconds(),
            mode: self.mode,
            target_index: vessel.target_waypoint_index(),
            distance_to_target_m: distance_m,
            desired_course_rad,
            heading_error_rad,
            heading_error_rate_rads,
            cross_track_error_m,
            cmd_speed_ms: self.cmd_speed_ms,
            rudder_angle_deg,
            prop_rpm,
            mission_complete: false,
        };

        self.archive(&report);

        Ok((dems, report))
    }
}

impl Guidance {
    fn archive(&mut self, report: &StatusReport) {
        if let Err(e) = self.report_archive.serialise(report) {
            warn!("Could not archive the guidance report: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::{GeoPoint, ProjectionZone};
    use crate::geofence::Geofence;
    use crate::vessel::{HullParams, Route};
    use comms_if::gnss::Fix;

    const ZONE: ProjectionZone = ProjectionZone::Utm33N;

    fn test_params() -> Params {
        util::params::from_str(
            r#"
            heading_k_p = 1.6
            heading_k_d = 19.92
            cross_track_k_p = 2.125
            cross_track_k_i = 92.1
            rudder_limit_deg = 35.0
            cycle_period_s = 0.2
            arrival_tolerance_m = 10.0
            turn_exit_heading_error_rad = 0.0872664626
            turn_exit_error_rate_rads = 0.0087266463
            min_speed_ms = 0.1
            cruise_speed_ms = 2.0
            speed_step_ms = 0.01
            speed_rpm_map_coeffs = [220.0, 0.0]
            "#,
        )
        .unwrap()
    }

    fn test_hull() -> HullParams {
        HullParams {
            name: "Blue Lady".into(),
            length_m: 13.78,
            breadth_m: 2.38,
            draft_m: 0.86,
            displacement_t: 22.83,
            x_g_m: 0.0,
            max_rudder_deg: 35.0,
        }
    }

    /// A vessel at the given fix with a route running due north from
    /// (46.780, 15.0), roughly 111 m per waypoint. The route sits on the
    /// zone 33N central meridian so grid north and true north coincide.
    fn test_vessel(lat: f64, lon: f64, heading: f64) -> Arc<VesselState> {
        let fix = Fix {
            lat_deg: lat,
            lon_deg: lon,
            heading_rad: Some(heading),
        };
        let center = GeoPoint::new(46.780, 15.0, ZONE);
        let geofence = Geofence::circular(center, 5_000.0).unwrap();
        let route = Route::new(vec![
            GeoPoint::new(46.780, 15.0, ZONE),
            GeoPoint::new(46.781, 15.0, ZONE),
            GeoPoint::new(46.782, 15.0, ZONE),
        ])
        .unwrap();

        Arc::new(VesselState::new(&fix, ZONE, geofence, route, test_hull()).unwrap())
    }

    #[test]
    fn test_on_track_is_straight_ahead() {
        // On the segment start, heading due north along a due-north
        // segment: no rudder, speed ramping up from zero.
        let vessel = test_vessel(46.780, 15.0, 0.0);
        let mut guidance = Guidance::with_params(test_params());

        let (dems, report) = guidance.proc(&vessel).unwrap();

        assert_eq!(guidance.mode(), Mode::Tracking);
        assert!(dems.rudder_angle_deg.abs() < 0.5, "{}", dems.rudder_angle_deg);
        assert!((report.cmd_speed_ms - 0.01).abs() < 1e-12);
        assert!(report.desired_course_rad.abs() < 0.01);
        assert!(report.cross_track_error_m.abs() < 0.5);
        assert!(!report.mission_complete);

        // Second cycle ramps further
        let (_, report) = guidance.proc(&vessel).unwrap();
        assert!((report.cmd_speed_ms - 0.02).abs() < 1e-12);
        assert_eq!(report.prop_rpm, 4);
    }

    #[test]
    fn test_starboard_offset_steers_port() {
        // Vessel east (starboard) of the due-north track, heading north:
        // the cross-track terms must command a port (negative) rudder.
        let vessel = test_vessel(46.7805, 15.0004, 0.0);
        let mut guidance = Guidance::with_params(test_params());

        let (dems, report) = guidance.proc(&vessel).unwrap();

        assert!(report.cross_track_error_m > 1.0);
        assert!(dems.rudder_angle_deg < 0.0);
    }

    #[test]
    fn test_rudder_demand_is_clamped() {
        // Heading due south on a due-north track gives a huge heading
        // error, the demand must still sit inside the mechanical limit.
        let vessel = test_vessel(46.780, 15.0, std::f64::consts::PI);
        let mut guidance = Guidance::with_params(test_params());

        let (dems, _) = guidance.proc(&vessel).unwrap();
        assert!(dems.rudder_angle_deg.abs() <= 35.0);
    }

    #[test]
    fn test_arrival_enters_turning_and_advances() {
        // Within the 10 m tolerance of the first target and pointing well
        // off the next course: the cursor moves on and the controller
        // drops into turning mode.
        let vessel = test_vessel(46.781, 15.0, 1.5);
        let mut guidance = Guidance::with_params(test_params());
        guidance.integral_ey = 3.0;

        let (_, report) = guidance.proc(&vessel).unwrap();

        assert_eq!(guidance.mode(), Mode::Turning);
        assert_eq!(report.target_index, 2);
        assert_eq!(guidance.integral_ey, 0.0);
        assert!(!report.mission_complete);
    }

    #[test]
    fn test_arrival_clears_controller_memory() {
        // Two controllers run the same arrival cycle, differing only in
        // the error memory carried from the old segment. The rudder
        // demand after the waypoint advance must not see that memory.
        let mut clean = Guidance::with_params(test_params());

        let mut stale = Guidance::with_params(test_params());
        stale.prev_heading_error = 2.0;
        stale.integral_ey = 5.0;

        let (clean_dems, _) = clean.proc(&test_vessel(46.781, 15.0, 1.5)).unwrap();
        let (stale_dems, _) = stale.proc(&test_vessel(46.781, 15.0, 1.5)).unwrap();

        assert_eq!(clean_dems, stale_dems);
    }

    #[test]
    fn test_tracking_resume_clears_previous_error() {
        // Aligned well enough to exit turning: the resumed tracking mode
        // starts with a cleared heading error memory.
        let vessel = test_vessel(46.780, 15.0, -0.05);
        let mut guidance = Guidance::with_params(test_params());
        guidance.mode = Mode::Turning;
        guidance.prev_heading_error = 0.05;

        let (_, _) = guidance.proc(&vessel).unwrap();

        assert_eq!(guidance.mode(), Mode::Tracking);
        assert_eq!(guidance.prev_heading_error, 0.0);
        assert_eq!(guidance.integral_ey, 0.0);
    }

    #[test]
    fn test_turning_exits_when_aligned() {
        // In turning mode but already aligned with the course to target:
        // one cycle is enough to resume tracking.
        let vessel = test_vessel(46.780, 15.0, 0.0);
        let mut guidance = Guidance::with_params(test_params());
        guidance.mode = Mode::Turning;
        guidance.cmd_speed_ms = 1.0;

        let (_, report) = guidance.proc(&vessel).unwrap();

        assert_eq!(guidance.mode(), Mode::Tracking);
        // The turning cycle still ramps the speed down
        assert!((report.cmd_speed_ms - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_turning_slows_to_minimum() {
        let vessel = test_vessel(46.780, 15.0, 2.0);
        let mut guidance = Guidance::with_params(test_params());
        guidance.mode = Mode::Turning;
        guidance.cmd_speed_ms = 0.105;

        guidance.proc(&vessel).unwrap();
        let (_, report) = guidance.proc(&vessel).unwrap();

        assert_eq!(guidance.mode(), Mode::Turning);
        assert!((report.cmd_speed_ms - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_route_exhaustion_reports_complete() {
        let vessel = test_vessel(46.780, 15.0, 0.0);
        // Walk the cursor off the end of the route
        vessel.advance_waypoint();
        vessel.advance_waypoint();

        let mut guidance = Guidance::with_params(test_params());
        let (dems, report) = guidance.proc(&vessel).unwrap();

        assert_eq!(dems, ActuatorDems::neutral());
        assert!(report.mission_complete);
    }

    #[test]
    fn test_proc_without_init_is_an_error() {
        let vessel = test_vessel(46.780, 15.0, 0.0);
        let mut guidance = Guidance::default();

        assert!(matches!(
            guidance.proc(&vessel),
            Err(ProcError::NotInitialised)
        ));
    }
}
