//! # Geodetic frame module
//!
//! This module turns ellipsoidal latitude/longitude into the locally-flat
//! Cartesian frame the rest of the software works in. Each `GeoPoint`
//! carries the projection zone it was built under, offsets and planar
//! distances are only defined between points of the same zone.
//!
//! Three frames are involved:
//!
//! - the ellipsoidal WGS84 frame (degrees),
//! - the projected planar frame (meters, X east, Y north),
//! - the vessel body frame (meters, Xb ahead, Yb to starboard), reached by
//!   rotating the NED offset by the heading.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod proj;

pub use proj::{utm_zone_number, ProjectionZone};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Mean Earth radius in meters, used by the haversine distance.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_000.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by the geodetic frame.
///
/// These are usage errors (a mistake in the calling code), not transient
/// sensor conditions, and are reported as such.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeoError {
    #[error(
        "Points built under different projection zones ({0:?} and {1:?}) cannot be mixed in \
         offset or planar distance calculations"
    )]
    ZoneMismatch(ProjectionZone, ProjectionZone),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A geodetic point: latitude/longitude on the WGS84 ellipsoid plus the
/// projection zone its planar coordinates are expressed in.
///
/// `GeoPoint` is an immutable value type. The coordinates are only ever
/// replaced as a pair (`with_coordinates`), never one at a time, so a
/// half-updated point cannot be observed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat_deg: f64,
    lon_deg: f64,
    zone: ProjectionZone,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GeoPoint {
    /// Build a new point under the given projection zone.
    pub fn new(lat_deg: f64, lon_deg: f64, zone: ProjectionZone) -> Self {
        Self {
            lat_deg,
            lon_deg,
            zone,
        }
    }

    /// Build a point from planar (east, north) coordinates under the given
    /// zone, through the inverse projection.
    pub fn from_planar(east_m: f64, north_m: f64, zone: ProjectionZone) -> Self {
        let (lat_deg, lon_deg) = proj::inverse(east_m, north_m, zone);
        Self {
            lat_deg,
            lon_deg,
            zone,
        }
    }

    /// Latitude in degrees.
    pub fn lat_deg(&self) -> f64 {
        self.lat_deg
    }

    /// Longitude in degrees.
    pub fn lon_deg(&self) -> f64 {
        self.lon_deg
    }

    /// The projection zone this point was built under.
    pub fn zone(&self) -> ProjectionZone {
        self.zone
    }

    /// Return a new point with both coordinates replaced, keeping the zone.
    pub fn with_coordinates(&self, lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            zone: self.zone,
        }
    }

    /// Project into the planar frame: (east, north) in meters.
    ///
    /// Pure function of the coordinates and the zone.
    pub fn project(&self) -> Vector2<f64> {
        let (east, north) = proj::forward(self.lat_deg, self.lon_deg, self.zone);
        Vector2::new(east, north)
    }

    /// Great-circle distance to another point in meters.
    ///
    /// Standard haversine formula on the mean Earth radius. Symmetric,
    /// non-negative and zero for coincident coordinates. Zone-independent
    /// since it works on the ellipsoidal coordinates directly.
    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat_deg.to_radians();
        let lat2 = other.lat_deg.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.lon_deg - self.lon_deg).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

        2.0 * MEAN_EARTH_RADIUS_M * a.sqrt().asin()
    }

    /// NED offset (north, east) in meters of this point from an origin.
    pub fn ned_offset_from(&self, origin: &GeoPoint) -> Result<(f64, f64), GeoError> {
        self.check_zone(origin)?;

        let p = self.project();
        let o = origin.project();

        Ok((p[1] - o[1], p[0] - o[0]))
    }

    /// Offset of this point from an origin, rotated into the body frame of
    /// a vessel at that origin with the given heading.
    ///
    /// `Xb` is ahead, `Yb` is to starboard. A zero displacement maps to
    /// (0, 0) for any heading.
    pub fn body_frame_offset_from(
        &self,
        origin: &GeoPoint,
        heading_psi: f64,
    ) -> Result<(f64, f64), GeoError> {
        let (north, east) = self.ned_offset_from(origin)?;

        let cos_psi = heading_psi.cos();
        let sin_psi = heading_psi.sin();

        let xb = cos_psi * north + sin_psi * east;
        let yb = -sin_psi * north + cos_psi * east;

        Ok((xb, yb))
    }

    /// Planar (projected) Euclidean distance to another point in meters.
    pub fn planar_distance_to(&self, other: &GeoPoint) -> Result<f64, GeoError> {
        self.check_zone(other)?;
        Ok((other.project() - self.project()).norm())
    }

    fn check_zone(&self, other: &GeoPoint) -> Result<(), GeoError> {
        if self.zone != other.zone {
            Err(GeoError::ZoneMismatch(self.zone, other.zone))
        }
        else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    /// Balatonboglár harbour, zone 33N
    fn boglar() -> GeoPoint {
        GeoPoint::new(46.78157, 17.64374, ProjectionZone::Utm33N)
    }

    #[test]
    fn test_projection_round_trip() {
        for &(lat, lon, zone) in &[
            (46.78157, 17.64374, ProjectionZone::Utm33N),
            (47.47, 19.03, ProjectionZone::Utm34N),
            (43.73, 7.42, ProjectionZone::Utm32N),
        ] {
            let p = GeoPoint::new(lat, lon, zone);
            let planar = p.project();
            let back = GeoPoint::from_planar(planar[0], planar[1], zone);

            assert!(
                (back.lat_deg() - lat).abs() < 1e-6,
                "latitude round trip failed for {:?}",
                zone
            );
            assert!(
                (back.lon_deg() - lon).abs() < 1e-6,
                "longitude round trip failed for {:?}",
                zone
            );
        }
    }

    #[test]
    fn test_round_trip_not_asserted_across_zones() {
        // Projecting under one zone and inverting under another is a
        // documented incompatibility, the coordinates come back shifted by
        // the central meridian difference. Only check it doesn't match.
        let p = boglar();
        let planar = p.project();
        let back = GeoPoint::from_planar(planar[0], planar[1], ProjectionZone::Utm34N);

        assert!((back.lon_deg() - p.lon_deg()).abs() > 1.0);
    }

    #[test]
    fn test_haversine_properties() {
        let a = boglar();
        let b = GeoPoint::new(46.78077, 17.64250, ProjectionZone::Utm33N);

        assert_eq!(a.haversine_distance(&b), b.haversine_distance(&a));
        assert_eq!(a.haversine_distance(&a), 0.0);
        assert!(a.haversine_distance(&b) > 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude along a meridian is about 111.2 km on the
        // mean sphere.
        let a = GeoPoint::new(46.0, 17.0, ProjectionZone::Utm33N);
        let b = GeoPoint::new(47.0, 17.0, ProjectionZone::Utm33N);

        let d = a.haversine_distance(&b);
        assert!((d - 111_195.0).abs() < 50.0, "got {}", d);
    }

    /// On the zone 33N central meridian, where grid north and true north
    /// coincide (away from it meridian convergence tilts them apart).
    fn on_meridian() -> GeoPoint {
        GeoPoint::new(46.78157, 15.0, ProjectionZone::Utm33N)
    }

    #[test]
    fn test_ned_offset_against_latitude_scale() {
        // 0.001 deg of latitude is ~111.2 m of northing and, on the
        // central meridian, no easting.
        let origin = on_meridian();
        let p = origin.with_coordinates(origin.lat_deg() + 0.001, origin.lon_deg());

        let (north, east) = p.ned_offset_from(&origin).unwrap();
        assert!((north - 111.2).abs() < 1.0, "north {}", north);
        assert!(east.abs() < 1.0, "east {}", east);
    }

    #[test]
    fn test_zone_mismatch_is_an_error() {
        let a = boglar();
        let b = GeoPoint::new(47.47, 19.03, ProjectionZone::Utm34N);

        assert_eq!(
            a.ned_offset_from(&b),
            Err(GeoError::ZoneMismatch(
                ProjectionZone::Utm33N,
                ProjectionZone::Utm34N
            ))
        );
        assert!(a.planar_distance_to(&b).is_err());
    }

    #[test]
    fn test_body_frame_offset() {
        let origin = on_meridian();

        // Zero displacement is (0, 0) for any heading
        for &psi in &[0.0, 1.0, PI, -2.5] {
            let (xb, yb) = origin.body_frame_offset_from(&origin, psi).unwrap();
            assert!(xb.abs() < 1e-9);
            assert!(yb.abs() < 1e-9);
        }

        // A point due north of the origin with the vessel heading north is
        // dead ahead; heading east it's off the port side (negative Yb).
        let ahead = origin.with_coordinates(origin.lat_deg() + 0.001, origin.lon_deg());

        let (xb, yb) = ahead.body_frame_offset_from(&origin, 0.0).unwrap();
        assert!(xb > 100.0);
        assert!(yb.abs() < 1.0);

        let (xb, yb) = ahead.body_frame_offset_from(&origin, PI / 2.0).unwrap();
        assert!(xb.abs() < 1.0);
        assert!(yb < -100.0);
    }

    #[test]
    fn test_with_coordinates_keeps_zone() {
        let p = boglar().with_coordinates(10.0, 20.0);
        assert_eq!(p.zone(), ProjectionZone::Utm33N);
        assert_eq!(p.lat_deg(), 10.0);
        assert_eq!(p.lon_deg(), 20.0);
    }

    #[test]
    fn test_utm_zone_number() {
        assert_eq!(utm_zone_number(17.64), 33);
        assert_eq!(utm_zone_number(19.03), 34);
        assert_eq!(utm_zone_number(7.42), 32);
    }
}
