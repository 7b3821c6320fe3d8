//! Static hull parameters
//!
//! These describe the physical vessel and never change during a mission.
//! The hull dynamics matrices (mass/Coriolis/damping) are deliberately
//! absent, the control law runs on the kinematic approximation only.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Immutable hull parameter record, loaded once from `hull.toml`.
#[derive(Deserialize, Debug, Clone)]
pub struct HullParams {
    /// Human readable hull name, e.g. "Blue Lady"
    pub name: String,

    /// Length over all in meters
    pub length_m: f64,

    /// Breadth in meters
    pub breadth_m: f64,

    /// Draft in meters
    pub draft_m: f64,

    /// Displacement in tonnes
    pub displacement_t: f64,

    /// Longitudinal centre of gravity offset in meters (usually 0)
    pub x_g_m: f64,

    /// The mechanical rudder limit in degrees
    pub max_rudder_deg: f64,
}
