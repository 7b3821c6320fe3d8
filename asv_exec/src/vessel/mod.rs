//! # Vessel state module
//!
//! There is exactly one vessel per process, and this module holds the one
//! shared representation of where it is and how it is moving. The state is
//! explicitly constructed at mission start and passed by `Arc` to the two
//! activities that need it: the position-refresh loop (writing fixes) and
//! the control loop (reading snapshots, writing bus telemetry and the route
//! cursor).
//!
//! All dynamic fields live in one small record behind a single mutex. Reads
//! copy the record out as a snapshot, so no reader can ever observe a
//! half-written position. The lock is only ever held for the duration of
//! the copy, never across I/O.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod hull;
pub mod route;

pub use hull::HullParams;
pub use route::{Route, RouteError};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use std::sync::{Mutex, PoisonError};

// Internal
use crate::geo::{GeoError, GeoPoint, ProjectionZone};
use crate::geofence::Geofence;
use comms_if::bus::KinTm;
use comms_if::gnss::Fix;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The dynamic fields of the vessel, kept together so they are updated and
/// copied as one unit.
#[derive(Debug, Clone)]
struct VesselRecord {
    /// Current position
    position: GeoPoint,

    /// Heading in radians from true north, positive towards east
    heading_psi: f64,

    /// Surge velocity in meters/second
    u_ms: f64,

    /// Sway velocity in meters/second
    v_ms: f64,

    /// Yaw rate in radians/second
    r_rads: f64,

    /// Rudder angle feedback from the bus in degrees
    rudder_angle_deg: f64,

    /// Engine speed feedback from the bus in rpm
    engine_rpm: u16,

    /// The mission route and its segment cursor
    route: Route,
}

/// A consistent copy of the vessel's dynamic state at one instant.
#[derive(Debug, Copy, Clone)]
pub struct VesselSnapshot {
    pub position: GeoPoint,
    pub heading_psi: f64,
    pub u_ms: f64,
    pub v_ms: f64,
    pub r_rads: f64,
    pub rudder_angle_deg: f64,
    pub engine_rpm: u16,
}

/// The shared vessel state.
pub struct VesselState {
    record: Mutex<VesselRecord>,

    /// The operational boundary commanded moves are checked against
    geofence: Geofence,

    /// Origin for body-frame offset computation, the initial fix position
    reference: GeoPoint,

    /// Static hull parameters
    hull: HullParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when constructing the vessel state.
#[derive(Debug, thiserror::Error)]
pub enum VesselStateError {
    #[error("The initial fix ({lat_deg}, {lon_deg}) is not a valid WGS84 coordinate")]
    InvalidInitialFix { lat_deg: f64, lon_deg: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VesselState {
    /// Create the vessel state at mission start.
    ///
    /// Requires an initial valid fix, the mission geofence and route, and
    /// the hull parameters. The initial position becomes the reference
    /// origin for body-frame offsets.
    pub fn new(
        initial_fix: &Fix,
        zone: ProjectionZone,
        geofence: Geofence,
        route: Route,
        hull: HullParams,
    ) -> Result<Self, VesselStateError> {
        if initial_fix.lat_deg.abs() > 90.0 || initial_fix.lon_deg.abs() > 180.0 {
            return Err(VesselStateError::InvalidInitialFix {
                lat_deg: initial_fix.lat_deg,
                lon_deg: initial_fix.lon_deg,
            });
        }

        let position = GeoPoint::new(initial_fix.lat_deg, initial_fix.lon_deg, zone);

        if !geofence.contains(&position) {
            // Sensor truth is never rejected, but starting outside the
            // boundary deserves a shout.
            warn!(
                "Initial fix ({:.6}, {:.6}) lies outside the operational geofence",
                initial_fix.lat_deg, initial_fix.lon_deg
            );
        }

        Ok(Self {
            record: Mutex::new(VesselRecord {
                position,
                heading_psi: initial_fix.heading_rad.unwrap_or(0.0),
                u_ms: 0.0,
                v_ms: 0.0,
                r_rads: 0.0,
                rudder_angle_deg: 0.0,
                engine_rpm: 0,
                route,
            }),
            geofence,
            reference: position,
            hull,
        })
    }

    /// Take a consistent snapshot of the dynamic state.
    pub fn snapshot(&self) -> VesselSnapshot {
        let rec = self.lock();
        VesselSnapshot {
            position: rec.position,
            heading_psi: rec.heading_psi,
            u_ms: rec.u_ms,
            v_ms: rec.v_ms,
            r_rads: rec.r_rads,
            rudder_angle_deg: rec.rudder_angle_deg,
            engine_rpm: rec.engine_rpm,
        }
    }

    /// Write a freshly-sensed position (and heading when present).
    ///
    /// This is the trusted telemetry-ingest path, it is deliberately not
    /// geofence checked: geofencing applies to commanded moves, not to
    /// sensor truth.
    pub fn apply_fix(&self, fix: &Fix) {
        let mut rec = self.lock();
        rec.position = rec.position.with_coordinates(fix.lat_deg, fix.lon_deg);
        if let Some(psi) = fix.heading_rad {
            rec.heading_psi = psi;
        }
        debug!(
            "Fix applied: ({:.6}, {:.6})",
            fix.lat_deg, fix.lon_deg
        );
    }

    /// Request a commanded move to a target position.
    ///
    /// Succeeds and writes the position only if the active geofence
    /// contains the target. A rejected move leaves the state unchanged and
    /// returns `false`, this is an expected outcome the caller must check,
    /// not a fault.
    pub fn request_move(&self, target: &GeoPoint) -> bool {
        if !self.geofence.contains(target) {
            warn!(
                "Rejected commanded move to ({:.6}, {:.6}): outside the geofence",
                target.lat_deg(),
                target.lon_deg()
            );
            return false;
        }

        let mut rec = self.lock();
        rec.position = rec
            .position
            .with_coordinates(target.lat_deg(), target.lon_deg());
        true
    }

    /// Overwrite the cached kinematic telemetry from the bus.
    ///
    /// Does not touch the position.
    pub fn update_from_bus(&self, tm: &KinTm) {
        let mut rec = self.lock();
        rec.u_ms = tm.u_ms;
        rec.v_ms = tm.v_ms;
        rec.r_rads = tm.r_rads;
        rec.rudder_angle_deg = tm.rudder_angle_deg;
        rec.engine_rpm = tm.engine_rpm;
    }

    /// The route segment currently being tracked.
    pub fn current_segment(&self) -> Option<(GeoPoint, GeoPoint)> {
        self.lock().route.current_segment()
    }

    /// Advance the route cursor to the next segment.
    ///
    /// Only called from the control loop. Returns `true` while a segment
    /// remains active.
    pub fn advance_waypoint(&self) -> bool {
        self.lock().route.advance()
    }

    /// Index of the current target waypoint.
    pub fn target_waypoint_index(&self) -> usize {
        self.lock().route.target_index()
    }

    /// Drop waypoints the route cursor has already consumed.
    pub fn truncate_consumed_waypoints(&self) {
        self.lock().route.truncate_consumed()
    }

    /// Is the vessel currently inside the operational boundary?
    pub fn is_within_geofence(&self) -> bool {
        let position = self.lock().position;
        self.geofence.contains(&position)
    }

    /// The vessel's position in its own body frame relative to the
    /// reference origin: (Xb ahead, Yb to starboard).
    pub fn body_frame_position(&self) -> Result<(f64, f64), GeoError> {
        let (position, heading) = {
            let rec = self.lock();
            (rec.position, rec.heading_psi)
        };
        position.body_frame_offset_from(&self.reference, heading)
    }

    /// The reference origin (initial fix position).
    pub fn reference_point(&self) -> GeoPoint {
        self.reference
    }

    pub fn geofence(&self) -> &Geofence {
        &self.geofence
    }

    pub fn hull(&self) -> &HullParams {
        &self.hull
    }

    /// Acquire the record lock.
    ///
    /// A poisoned lock is recovered rather than propagated: every writer
    /// replaces whole fields, so the record is consistent even if a panic
    /// unwound through a holder.
    fn lock(&self) -> std::sync::MutexGuard<'_, VesselRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const ZONE: ProjectionZone = ProjectionZone::Utm33N;

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

    fn test_state() -> VesselState {
        let fix = Fix {
            lat_deg: 46.782,
            lon_deg: 17.645,
            heading_rad: Some(0.0),
        };
        let center = GeoPoint::new(46.782, 17.645, ZONE);
        let geofence = Geofence::circular(center, 3_000.0).unwrap();
        let route = Route::new(vec![
            GeoPoint::new(46.782, 17.645, ZONE),
            GeoPoint::new(46.783, 17.646, ZONE),
        ])
        .unwrap();

        VesselState::new(&fix, ZONE, geofence, route, test_hull()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_initial_fix() {
        let fix = Fix {
            lat_deg: 95.0,
            lon_deg: 17.645,
            heading_rad: None,
        };
        let center = GeoPoint::new(46.782, 17.645, ZONE);
        let geofence = Geofence::circular(center, 3_000.0).unwrap();
        let route = Route::new(vec![
            GeoPoint::new(46.782, 17.645, ZONE),
            GeoPoint::new(46.783, 17.646, ZONE),
        ])
        .unwrap();

        assert!(VesselState::new(&fix, ZONE, geofence, route, test_hull()).is_err());
    }

    #[test]
    fn test_request_move_policy() {
        let state = test_state();
        let before = state.snapshot().position;

        // Outside the 3 km fence: rejected, state unchanged
        let outside = GeoPoint::new(47.5, 18.5, ZONE);
        assert!(!state.request_move(&outside));
        assert_eq!(state.snapshot().position, before);

        // Inside: accepted, snapshot reflects the new position
        let inside = GeoPoint::new(46.7825, 17.6455, ZONE);
        assert!(state.request_move(&inside));
        let after = state.snapshot().position;
        assert_eq!(after.lat_deg(), 46.7825);
        assert_eq!(after.lon_deg(), 17.6455);
    }

    #[test]
    fn test_apply_fix_is_not_geofence_checked() {
        let state = test_state();

        // Sensor truth outside the fence is still written
        let fix = Fix {
            lat_deg: 47.5,
            lon_deg: 18.5,
            heading_rad: Some(1.0),
        };
        state.apply_fix(&fix);

        let snap = state.snapshot();
        assert_eq!(snap.position.lat_deg(), 47.5);
        assert_eq!(snap.heading_psi, 1.0);
        assert!(!state.is_within_geofence());
    }

    #[test]
    fn test_update_from_bus_leaves_position_alone() {
        let state = test_state();
        let before = state.snapshot().position;

        let tm = KinTm {
            u_ms: 1.5,
            v_ms: -0.2,
            r_rads: 0.1,
            rudder_angle_deg: -3.0,
            engine_rpm: 440,
        };
        state.update_from_bus(&tm);

        let snap = state.snapshot();
        assert_eq!(snap.position, before);
        assert_eq!(snap.u_ms, 1.5);
        assert_eq!(snap.v_ms, -0.2);
        assert_eq!(snap.r_rads, 0.1);
        assert_eq!(snap.rudder_angle_deg, -3.0);
        assert_eq!(snap.engine_rpm, 440);
    }

    #[test]
    fn test_snapshots_are_never_torn() {
        // A writer thread applies fixes where lon always equals lat + 1.0,
        // readers must never see a pair breaking that relation.
        let state = Arc::new(test_state());

        let writer_state = state.clone();
        let writer = thread::spawn(move || {
            for i in 0..5_000 {
                let lat = 46.0 + (i as f64) * 1e-5;
                writer_state.apply_fix(&Fix {
                    lat_deg: lat,
                    lon_deg: lat + 1.0,
                    heading_rad: None,
                });
            }
        });

        for _ in 0..5_000 {
            let snap = state.snapshot();
            let lat = snap.position.lat_deg();
            let lon = snap.position.lon_deg();
            // Initial position also satisfies a fixed relation check only
            // after the first write, so allow the seed value through.
            if lat >= 46.0 && lat < 46.1 {
                assert!((lon - (lat + 1.0)).abs() < 1e-12, "torn read: {} {}", lat, lon);
            }
        }

        writer.join().unwrap();
    }

    #[test]
    fn test_body_frame_position_at_origin() {
        let state = test_state();
        let (xb, yb) = state.body_frame_position().unwrap();
        assert!(xb.abs() < 1e-9);
        assert!(yb.abs() < 1e-9);
    }

    #[test]
    fn test_route_cursor_access() {
        let state = test_state();
        assert_eq!(state.target_waypoint_index(), 1);
        assert!(state.current_segment().is_some());
        assert!(!state.advance_waypoint());
        assert!(state.current_segment().is_none());
    }
}
