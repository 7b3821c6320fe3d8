//! Transverse Mercator projection for the supported UTM zones.
//!
//! The forward and inverse transforms are the standard series expansions
//! (Snyder, "Map Projections - A Working Manual", eqs. 8-9 to 8-25) on the
//! WGS84 ellipsoid. Within a zone the round-trip error is far below the
//! 1e-6 degree tolerance the rest of the software assumes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// UTM central scale factor.
const K0: f64 = 0.9996;

/// UTM false easting in meters.
const FALSE_EASTING: f64 = 500_000.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The projection zone a point's planar coordinates are expressed in.
///
/// Only the northern-hemisphere zones covering the operational areas are
/// supported. The zone is fixed when a point is constructed and is never
/// silently changed, projecting near a zone boundary is allowed but keeping
/// the zones of related points consistent is the caller's responsibility.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionZone {
    /// UTM zone 32N (EPSG:32632), 6E to 12E.
    Utm32N,

    /// UTM zone 33N (EPSG:32633), 12E to 18E. Covers Lake Balaton.
    Utm33N,

    /// UTM zone 34N (EPSG:32634), 18E to 24E. Covers Budapest.
    Utm34N,
}

impl ProjectionZone {
    /// The UTM zone number.
    pub fn number(&self) -> u8 {
        match self {
            ProjectionZone::Utm32N => 32,
            ProjectionZone::Utm33N => 33,
            ProjectionZone::Utm34N => 34,
        }
    }

    /// The zone's central meridian in degrees east.
    pub fn central_meridian_deg(&self) -> f64 {
        (self.number() as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// The UTM zone number a longitude naturally falls in.
///
/// Used at mission setup to warn about a configured zone that does not match
/// the operating area, the configured zone is still used as-is.
pub fn utm_zone_number(lon_deg: f64) -> u8 {
    ((lon_deg + 180.0) / 6.0) as u8 + 1
}

/// Forward transform: ellipsoidal (lat, lon) in degrees to planar
/// (east, north) in meters under the given zone.
pub fn forward(lat_deg: f64, lon_deg: f64, zone: ProjectionZone) -> (f64, f64) {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = e2 / (1.0 - e2);

    let phi = lat_deg.to_radians();
    let dlam = (lon_deg - zone.central_meridian_deg()).to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();

    let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = phi.tan() * phi.tan();
    let c = ep2 * cos_phi * cos_phi;
    let a = cos_phi * dlam;

    let m = meridian_arc(phi, e2);

    let east = FALSE_EASTING
        + K0 * n
            * (a
                + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);

    let north = K0
        * (m
            + n * phi.tan()
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

    (east, north)
}

/// Inverse transform: planar (east, north) in meters under the given zone
/// back to ellipsoidal (lat, lon) in degrees.
pub fn inverse(east: f64, north: f64, zone: ProjectionZone) -> (f64, f64) {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = e2 / (1.0 - e2);
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let x = east - FALSE_EASTING;
    let m = north / K0;

    // Footpoint latitude
    let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();

    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = phi1.tan() * phi1.tan();
    let n1 = WGS84_A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * phi1.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon = zone.central_meridian_deg().to_radians()
        + (d
            - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    (lat.to_degrees(), lon.to_degrees())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Meridian arc length from the equator to latitude `phi`.
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e2 * e2 / 32.0 + 45.0 * e2.powi(3) / 1024.0)
                * (2.0 * phi).sin()
            + (15.0 * e2 * e2 / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * phi).sin())
}
