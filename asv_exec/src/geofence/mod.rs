//! # Geofence module
//!
//! The geofence is the operational boundary of the mission. Two variants
//! exist, a circle around a center point and a simple polygon, both
//! answering the same containment queries. Invalid geometry is rejected at
//! construction, a geofence that exists is always usable.
//!
//! `contains` is the strict (open) interior test, `covers` additionally
//! accepts points on the boundary. A commanded move is checked with
//! `contains`, so driving the vessel exactly onto the fence line is already
//! rejected.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use crate::geo::GeoPoint;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance in degrees for the point-on-edge and degenerate-area tests.
///
/// About a tenth of a millimeter at the equator, far below GNSS accuracy.
const EDGE_EPSILON_DEG: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when constructing a geofence.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeofenceError {
    #[error("A polygonal geofence needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("The polygon vertices are collinear or enclose no area")]
    DegenerateArea,

    #[error("The polygon ring is self-intersecting (edges {0} and {1} cross)")]
    SelfIntersecting(usize, usize),

    #[error("The geofence radius must be positive, got {0} m")]
    NonPositiveRadius(f64),
}

/// The operational boundary of a mission.
#[derive(Debug, Clone)]
pub enum Geofence {
    /// All points within `radius_m` (great-circle) of the center.
    Circular { center: GeoPoint, radius_m: f64 },

    /// A simple polygon given by its vertex ring in (lat, lon).
    Polygonal { vertices: Vec<GeoPoint> },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Geofence {
    /// Build a circular geofence.
    pub fn circular(center: GeoPoint, radius_m: f64) -> Result<Self, GeofenceError> {
        if radius_m <= 0.0 {
            return Err(GeofenceError::NonPositiveRadius(radius_m));
        }

        Ok(Geofence::Circular { center, radius_m })
    }

    /// Build a polygonal geofence from its vertex ring.
    ///
    /// Fails for fewer than 3 vertices, a collinear/zero-area ring, or a
    /// self-intersecting ring. No partially-built fence is ever returned.
    pub fn polygonal(vertices: Vec<GeoPoint>) -> Result<Self, GeofenceError> {
        if vertices.len() < 3 {
            return Err(GeofenceError::TooFewVertices(vertices.len()));
        }

        // Shoelace area in (lat, lon) space. Zero catches both collinear
        // vertex sets and degenerate rings.
        let mut area = 0.0;
        for i in 0..vertices.len() {
            let a = &vertices[i];
            let b = &vertices[(i + 1) % vertices.len()];
            area += a.lat_deg() * b.lon_deg() - b.lat_deg() * a.lon_deg();
        }
        if area.abs() / 2.0 < EDGE_EPSILON_DEG {
            return Err(GeofenceError::DegenerateArea);
        }

        // Reject rings where two non-adjacent edges properly cross.
        let n = vertices.len();
        for i in 0..n {
            for j in (i + 1)..n {
                // Adjacent edges (sharing a vertex) always touch
                if j == i || (j + 1) % n == i || (i + 1) % n == j {
                    continue;
                }

                let (a1, a2) = (&vertices[i], &vertices[(i + 1) % n]);
                let (b1, b2) = (&vertices[j], &vertices[(j + 1) % n]);

                if segments_cross(a1, a2, b1, b2) {
                    return Err(GeofenceError::SelfIntersecting(i, j));
                }
            }
        }

        Ok(Geofence::Polygonal { vertices })
    }

    /// Strict containment: is the point in the interior of the fence?
    ///
    /// For the circular variant a point at exactly the radius counts as
    /// inside (the boundary circle is reachable). For the polygonal variant
    /// a point exactly on an edge is classified outside.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        match self {
            Geofence::Circular { center, radius_m } => {
                center.haversine_distance(point) <= *radius_m
            }
            Geofence::Polygonal { vertices } => {
                !on_boundary(vertices, point) && ray_cast(vertices, point)
            }
        }
    }

    /// Closed containment: interior or boundary.
    pub fn covers(&self, point: &GeoPoint) -> bool {
        match self {
            Geofence::Circular { center, radius_m } => {
                center.haversine_distance(point) <= *radius_m
            }
            Geofence::Polygonal { vertices } => {
                on_boundary(vertices, point) || ray_cast(vertices, point)
            }
        }
    }
}

/// A short tag for status reports.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum GeofenceKind {
    Circular,
    Polygonal,
}

impl Geofence {
    pub fn kind(&self) -> GeofenceKind {
        match self {
            Geofence::Circular { .. } => GeofenceKind::Circular,
            Geofence::Polygonal { .. } => GeofenceKind::Polygonal,
        }
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A charted mark (buoy) with a clearance radius.
///
/// Used for mission annotation, not for containment policy.
#[derive(Debug, Copy, Clone)]
pub struct BuoyMark {
    pub position: GeoPoint,
    pub radius_m: f64,
}

impl BuoyMark {
    pub fn new(position: GeoPoint, radius_m: f64) -> Self {
        Self { position, radius_m }
    }

    /// Is the given point within the mark's clearance radius?
    pub fn is_within_radius(&self, point: &GeoPoint) -> bool {
        self.position.haversine_distance(point) <= self.radius_m
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Ray-casting parity test in (lat, lon) coordinates.
///
/// Casts a ray in the +longitude direction and counts edge crossings. The
/// result is unreliable for points on the boundary, callers handle those
/// through `on_boundary` first.
fn ray_cast(vertices: &[GeoPoint], point: &GeoPoint) -> bool {
    let (px, py) = (point.lat_deg(), point.lon_deg());
    let mut inside = false;

    let n = vertices.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (vertices[i].lat_deg(), vertices[i].lon_deg());
        let (xj, yj) = (vertices[j].lat_deg(), vertices[j].lon_deg());

        if ((xi > px) != (xj > px))
            && (py < (yj - yi) * (px - xi) / (xj - xi) + yi)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Is the point on any edge of the ring (within `EDGE_EPSILON_DEG`)?
fn on_boundary(vertices: &[GeoPoint], point: &GeoPoint) -> bool {
    let n = vertices.len();
    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];

        if point_on_segment(a, b, point) {
            return true;
        }
    }
    false
}

fn point_on_segment(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> bool {
    let (ax, ay) = (a.lat_deg(), a.lon_deg());
    let (bx, by) = (b.lat_deg(), b.lon_deg());
    let (px, py) = (p.lat_deg(), p.lon_deg());

    // Collinearity via the cross product of a->b and a->p
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross.abs() > EDGE_EPSILON_DEG {
        return false;
    }

    // Within the segment's bounding box
    px >= ax.min(bx) - EDGE_EPSILON_DEG
        && px <= ax.max(bx) + EDGE_EPSILON_DEG
        && py >= ay.min(by) - EDGE_EPSILON_DEG
        && py <= ay.max(by) + EDGE_EPSILON_DEG
}

/// Do two segments properly cross (intersect at a point interior to both)?
fn segments_cross(a1: &GeoPoint, a2: &GeoPoint, b1: &GeoPoint, b2: &GeoPoint) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn orient(a: &GeoPoint, b: &GeoPoint, c: &GeoPoint) -> f64 {
    (b.lat_deg() - a.lat_deg()) * (c.lon_deg() - a.lon_deg())
        - (b.lon_deg() - a.lon_deg()) * (c.lat_deg() - a.lat_deg())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
