//! Mission configuration
//!
//! A mission is described by a single `mission.toml`: the projection zone to
//! operate under, the geofence and the ordered waypoint list. This module
//! turns that file into the runtime `Geofence` and `Route` objects, with the
//! vessel's actual starting position prepended as the first waypoint so the
//! first segment always starts where the vessel is.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Deserialize;

// Internal
use crate::geo::{utm_zone_number, GeoPoint, ProjectionZone};
use crate::geofence::{Geofence, GeofenceError};
use crate::vessel::{Route, RouteError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mission parameters, loaded from `mission.toml`.
#[derive(Deserialize, Debug, Clone)]
pub struct MissionParams {
    /// The projection zone all mission points are built under.
    pub zone: ProjectionZone,

    /// The nominal start (berth) position. The live receiver overrides it
    /// at runtime, the desk simulation berths the vessel there.
    pub start: WaypointParams,

    /// The operational boundary.
    pub geofence: GeofenceParams,

    /// Ordered waypoints as raw coordinates.
    pub waypoints: Vec<WaypointParams>,
}

/// A raw waypoint coordinate pair.
#[derive(Deserialize, Debug, Copy, Clone)]
pub struct WaypointParams {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Geofence description as it appears in the mission file.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum GeofenceParams {
    Circular {
        center_lat_deg: f64,
        center_lon_deg: f64,
        radius_m: f64,
    },
    Polygonal {
        vertices: Vec<WaypointParams>,
    },
}

/// Errors raised while building the runtime mission objects.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("The mission geofence is invalid: {0}")]
    InvalidGeofence(#[from] GeofenceError),

    #[error("The mission route is invalid: {0}")]
    InvalidRoute(#[from] RouteError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionParams {
    /// Build the runtime geofence from the mission description.
    pub fn build_geofence(&self) -> Result<Geofence, MissionError> {
        let fence = match &self.geofence {
            GeofenceParams::Circular {
                center_lat_deg,
                center_lon_deg,
                radius_m,
            } => {
                self.warn_zone(*center_lon_deg, "geofence center");
                Geofence::circular(
                    GeoPoint::new(*center_lat_deg, *center_lon_deg, self.zone),
                    *radius_m,
                )?
            }
            GeofenceParams::Polygonal { vertices } => {
                let vertices = vertices
                    .iter()
                    .map(|v| {
                        self.warn_zone(v.lon_deg, "geofence vertex");
                        GeoPoint::new(v.lat_deg, v.lon_deg, self.zone)
                    })
                    .collect();
                Geofence::polygonal(vertices)?
            }
        };

        Ok(fence)
    }

    /// Build the mission route, prepending the vessel's starting position.
    pub fn build_route(&self, start: GeoPoint) -> Result<Route, MissionError> {
        let mut waypoints = Vec::with_capacity(self.waypoints.len() + 1);
        waypoints.push(start);

        for wp in &self.waypoints {
            self.warn_zone(wp.lon_deg, "waypoint");
            waypoints.push(GeoPoint::new(wp.lat_deg, wp.lon_deg, self.zone));
        }

        Ok(Route::new(waypoints)?)
    }

    /// The nominal start position under the mission zone.
    pub fn start_point(&self) -> GeoPoint {
        GeoPoint::new(self.start.lat_deg, self.start.lon_deg, self.zone)
    }

    /// The configured waypoints under the mission zone.
    pub fn waypoint_points(&self) -> Vec<GeoPoint> {
        self.waypoints
            .iter()
            .map(|wp| GeoPoint::new(wp.lat_deg, wp.lon_deg, self.zone))
            .collect()
    }

    /// Warn when a configured longitude does not naturally fall in the
    /// configured zone. The configured zone is still used as-is.
    fn warn_zone(&self, lon_deg: f64, what: &str) {
        let natural = utm_zone_number(lon_deg);
        if natural != self.zone.number() {
            warn!(
                "The {} at {:.4}E naturally falls in UTM zone {}, but the mission is \
                 configured for zone {}",
                what,
                lon_deg,
                natural,
                self.zone.number()
            );
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
