//! # Simulation equipment
//!
//! Scripted stand-ins for the GNSS receiver and the actuator bus, so the
//! full guidance loop can run on a desk with no hardware attached. Both
//! follow the behavioural contracts of the traits they implement: the GNSS
//! source never blocks past its timeout and the bus poll never blocks at
//! all.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use byteorder::{BigEndian, ByteOrder};
use std::collections::VecDeque;
use std::time::Duration;

// Internal
use crate::geo::GeoPoint;
use comms_if::bus::{ActuatorDems, BusConnector, BusError, BusFrame};
use comms_if::gnss::{Fix, GnssSource};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A GNSS source which replays a scripted track.
///
/// Once the script runs out the final fix is repeated, a vessel sitting
/// still at its last position. Dropouts can be injected by marking script
/// slots as misses.
pub struct SimGnss {
    track: VecDeque<Option<Fix>>,
    last: Option<Fix>,
}

/// A bus connector which replays queued telemetry and records every demand
/// it is asked to send.
///
/// Each sent demand is also echoed back as rudder and engine feedback
/// frames, the way the helm electronics do.
#[derive(Default)]
pub struct SimBus {
    telemetry: VecDeque<Vec<BusFrame>>,
    pub sent_dems: Vec<ActuatorDems>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimGnss {
    /// A source which replays the given fixes in order.
    pub fn from_track(track: Vec<Fix>) -> Self {
        Self {
            track: track.into_iter().map(Some).collect(),
            last: None,
        }
    }

    /// A source which replays fixes interleaved with dropouts (`None`
    /// slots yield a miss).
    pub fn from_script(script: Vec<Option<Fix>>) -> Self {
        Self {
            track: script.into(),
            last: None,
        }
    }
}

impl GnssSource for SimGnss {
    fn get_fix(&mut self, _timeout: Duration) -> Option<Fix> {
        match self.track.pop_front() {
            Some(Some(fix)) => {
                self.last = Some(fix);
                Some(fix)
            }
            // A scripted dropout
            Some(None) => None,
            // Script exhausted, hold the last position
            None => self.last,
        }
    }
}

impl SimBus {
    /// Queue a burst of telemetry frames to be returned by the next poll.
    pub fn queue_telemetry(&mut self, frames: Vec<BusFrame>) {
        self.telemetry.push_back(frames);
    }
}

impl BusConnector for SimBus {
    fn send_dems(&mut self, dems: &ActuatorDems) -> Result<(), BusError> {
        self.sent_dems.push(*dems);

        // Echo the demands back as feedback telemetry
        let mut rpm_data = vec![0u8; 2];
        BigEndian::write_u16(&mut rpm_data, dems.prop_rpm);
        self.telemetry.push_back(vec![
            BusFrame {
                id: comms_if::bus::RUDDER_TM_ID,
                data: vec![(dems.rudder_angle_deg * 10.0) as i32 as u8],
            },
            BusFrame {
                id: comms_if::bus::ENGINE_TM_ID,
                data: rpm_data,
            },
        ]);

        Ok(())
    }

    fn poll_telemetry(&mut self) -> Result<Vec<BusFrame>, BusError> {
        Ok(self.telemetry.pop_front().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Generate a fix track which traverses the given points in order at a
/// constant speed, one fix per receiver period.
///
/// The interpolation is done in the planar frame and the heading of each
/// fix is the course of the leg being traversed. Used to script a whole
/// mission for `SimGnss`.
pub fn track_along(points: &[GeoPoint], speed_ms: f64, period_s: f64) -> Vec<Fix> {
    let mut track = Vec::new();
    let step_m = speed_ms * period_s;

    for pair in points.windows(2) {
        let a = pair[0].project();
        let b = pair[1].project();

        let leg = b - a;
        let length = leg.norm();
        let course = leg[0].atan2(leg[1]);

        let steps = (length / step_m).ceil() as usize;
        for i in 0..steps {
            // The leg start is emitted exactly, only the intermediate
            // fixes go through the inverse projection (which round-trips
            // to ~1e-7 degrees, not bit-exactly).
            let point = if i == 0 {
                pair[0]
            }
            else {
                let p = a + leg * (i as f64 / steps as f64);
                GeoPoint::from_planar(p[0], p[1], pair[0].zone())
            };

            track.push(Fix {
                lat_deg: point.lat_deg(),
                lon_deg: point.lon_deg(),
                heading_rad: Some(course),
            });
        }
    }

    if let Some(last) = points.last() {
        track.push(Fix {
            lat_deg: last.lat_deg(),
            lon_deg: last.lon_deg(),
            heading_rad: track.last().and_then(|f| f.heading_rad),
        });
    }

    track
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::bus::VELOCITY_TM_ID;

    fn fix(lat: f64) -> Fix {
        Fix {
            lat_deg: lat,
            lon_deg: 17.64,
            heading_rad: None,
        }
    }

    #[test]
    fn test_gnss_replays_then_holds() {
        let mut gnss = SimGnss::from_track(vec![fix(46.780), fix(46.781)]);
        let t = Duration::from_millis(80);

        assert_eq!(gnss.get_fix(t).unwrap().lat_deg, 46.780);
        assert_eq!(gnss.get_fix(t).unwrap().lat_deg, 46.781);

        // Exhausted: the last fix is held forever
        assert_eq!(gnss.get_fix(t).unwrap().lat_deg, 46.781);
        assert_eq!(gnss.get_fix(t).unwrap().lat_deg, 46.781);
    }

    #[test]
    fn test_gnss_scripted_dropout() {
        let mut gnss = SimGnss::from_script(vec![Some(fix(46.780)), None, Some(fix(46.782))]);
        let t = Duration::from_millis(80);

        assert!(gnss.get_fix(t).is_some());
        assert!(gnss.get_fix(t).is_none());
        assert_eq!(gnss.get_fix(t).unwrap().lat_deg, 46.782);
    }

    #[test]
    fn test_bus_round() {
        use comms_if::bus::KinTm;

        let mut bus = SimBus::default();

        // Empty poll never blocks and never errors
        assert!(bus.poll_telemetry().unwrap().is_empty());

        bus.queue_telemetry(vec![BusFrame {
            id: VELOCITY_TM_ID,
            data: vec![15, 0, 0],
        }]);
        assert_eq!(bus.poll_telemetry().unwrap().len(), 1);

        // Demands are recorded and echoed back as feedback frames
        let dems = ActuatorDems {
            rudder_angle_deg: -5.0,
            prop_rpm: 440,
        };
        bus.send_dems(&dems).unwrap();
        assert_eq!(bus.sent_dems.len(), 1);

        let echo = KinTm::from_frames(&bus.poll_telemetry().unwrap()).unwrap();
        assert!((echo.rudder_angle_deg + 5.0).abs() < 1e-9);
        assert_eq!(echo.engine_rpm, 440);
    }

    #[test]
    fn test_track_along_route() {
        use crate::geo::ProjectionZone;

        // On the central meridian so the leg course is exactly grid north
        let points = vec![
            GeoPoint::new(46.780, 15.0, ProjectionZone::Utm33N),
            GeoPoint::new(46.781, 15.0, ProjectionZone::Utm33N),
        ];

        // ~111 m leg at 2 m/s with a 10 Hz receiver: several hundred fixes
        let track = track_along(&points, 2.0, 0.1);
        assert!(track.len() > 500);

        // Starts exactly at the first point, ends exactly on the last
        assert!((track[0].lat_deg - 46.780).abs() < 1e-9);
        let last = track.last().unwrap();
        assert!((last.lat_deg - 46.781).abs() < 1e-9);

        // Intermediate fixes go through the inverse projection and only
        // round-trip to the documented tolerance
        assert!((track[100].lon_deg - 15.0).abs() < 1e-6);

        // Course is due north all along
        assert!(track[1].heading_rad.unwrap().abs() < 0.01);
    }
}
