//! Route management
//!
//! A route is the ordered sequence of waypoints the mission follows, plus a
//! cursor marking the segment currently being tracked. Geometry that would
//! break the control law later (coincident waypoints, mixed projection
//! zones) is rejected when the route is built, never at control time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::geo::GeoPoint;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum planar length of a route segment in meters.
///
/// Anything shorter gives the cross-track law no usable course direction.
const MIN_SEGMENT_LENGTH_M: f64 = 0.001;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when constructing a route.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RouteError {
    #[error("A route needs at least 2 waypoints to form a segment, got {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoints {0} and {1} are coincident (zero segment length)")]
    CoincidentWaypoints(usize, usize),

    #[error("Waypoint {index} was built under a different projection zone: {source}")]
    ZoneMismatch {
        index: usize,
        source: crate::geo::GeoError,
    },
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered waypoint sequence with a segment cursor.
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<GeoPoint>,
    cursor: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Route {
    /// Build a route from an ordered waypoint list.
    pub fn new(waypoints: Vec<GeoPoint>) -> Result<Self, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::TooFewWaypoints(waypoints.len()));
        }

        for i in 0..(waypoints.len() - 1) {
            let length = waypoints[i]
                .planar_distance_to(&waypoints[i + 1])
                .map_err(|source| RouteError::ZoneMismatch {
                    index: i + 1,
                    source,
                })?;

            if length < MIN_SEGMENT_LENGTH_M {
                return Err(RouteError::CoincidentWaypoints(i, i + 1));
            }
        }

        Ok(Self {
            waypoints,
            cursor: 0,
        })
    }

    /// The segment currently being tracked: (start, target) waypoints.
    ///
    /// `None` once the route is exhausted.
    pub fn current_segment(&self) -> Option<(GeoPoint, GeoPoint)> {
        if self.cursor + 1 < self.waypoints.len() {
            Some((self.waypoints[self.cursor], self.waypoints[self.cursor + 1]))
        }
        else {
            None
        }
    }

    /// The waypoint currently being steered towards.
    pub fn target(&self) -> Option<GeoPoint> {
        self.current_segment().map(|(_, target)| target)
    }

    /// Advance the cursor to the next segment.
    ///
    /// Returns `true` if a new segment is now active, `false` if the route
    /// is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.waypoints.len() {
            self.cursor += 1;
        }
        self.current_segment().is_some()
    }

    /// Drop waypoints already consumed by the cursor, resetting the cursor
    /// onto the same active segment.
    pub fn truncate_consumed(&mut self) {
        self.waypoints.drain(0..self.cursor);
        self.cursor = 0;
    }

    /// Index of the current target waypoint within the route.
    pub fn target_index(&self) -> usize {
        self.cursor + 1
    }

    /// Number of waypoints still ahead of the vessel (including the current
    /// target).
    pub fn remaining(&self) -> usize {
        self.waypoints.len().saturating_sub(self.cursor + 1)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_segment().is_none()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::ProjectionZone;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon, ProjectionZone::Utm33N)
    }

    fn three_point_route() -> Route {
        Route::new(vec![
            pt(46.780, 17.640),
            pt(46.781, 17.641),
            pt(46.782, 17.642),
        ])
        .unwrap()
    }

    #[test]
    fn test_construction_failures() {
        assert_eq!(
            Route::new(vec![pt(46.78, 17.64)]).unwrap_err(),
            RouteError::TooFewWaypoints(1)
        );

        assert_eq!(
            Route::new(vec![pt(46.78, 17.64), pt(46.78, 17.64), pt(46.79, 17.65)])
                .unwrap_err(),
            RouteError::CoincidentWaypoints(0, 1)
        );

        let mixed = vec![
            pt(46.78, 17.64),
            GeoPoint::new(46.79, 17.65, ProjectionZone::Utm34N),
        ];
        assert!(matches!(
            Route::new(mixed).unwrap_err(),
            RouteError::ZoneMismatch { index: 1, .. }
        ));
    }

    #[test]
    fn test_cursor_advance_and_exhaustion() {
        let mut route = three_point_route();

        let (start, target) = route.current_segment().unwrap();
        assert_eq!(start, pt(46.780, 17.640));
        assert_eq!(target, pt(46.781, 17.641));
        assert_eq!(route.target_index(), 1);
        assert_eq!(route.remaining(), 2);

        assert!(route.advance());
        let (start, target) = route.current_segment().unwrap();
        assert_eq!(start, pt(46.781, 17.641));
        assert_eq!(target, pt(46.782, 17.642));

        assert!(!route.advance());
        assert!(route.is_exhausted());
        assert!(route.current_segment().is_none());
        assert!(route.target().is_none());
    }

    #[test]
    fn test_truncate_consumed() {
        let mut route = three_point_route();
        route.advance();

        route.truncate_consumed();
        assert_eq!(route.target_index(), 1);
        let (start, target) = route.current_segment().unwrap();
        assert_eq!(start, pt(46.781, 17.641));
        assert_eq!(target, pt(46.782, 17.642));
    }
}
