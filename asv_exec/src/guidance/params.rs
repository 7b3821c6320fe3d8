//! Guidance parameters
//!
//! Loaded from `guidance.toml`. The controller gains come from the tuned
//! lake trials and should not be changed without re-running them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Guidance module parameters.
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Heading error proportional gain.
    pub heading_k_p: f64,

    /// Heading error rate (derivative) gain.
    pub heading_k_d: f64,

    /// Cross-track error proportional gain.
    pub cross_track_k_p: f64,

    /// Cross-track error integral gain.
    pub cross_track_k_i: f64,

    /// Mechanical rudder demand limit in degrees, demands are clamped to
    /// +/- this value.
    pub rudder_limit_deg: f64,

    /// Nominal control cycle period in seconds, used for the integral and
    /// derivative terms.
    pub cycle_period_s: f64,

    /// A waypoint counts as reached inside this distance in meters.
    pub arrival_tolerance_m: f64,

    /// Turning mode exits below this absolute heading error in radians.
    pub turn_exit_heading_error_rad: f64,

    /// Turning mode exits below this absolute heading error rate in
    /// radians/second.
    pub turn_exit_error_rate_rads: f64,

    /// Floor of the speed ramp while turning, in meters/second.
    pub min_speed_ms: f64,

    /// Cruise speed the tracking ramp builds towards, in meters/second.
    pub cruise_speed_ms: f64,

    /// Speed demand change per cycle in meters/second.
    pub speed_step_ms: f64,

    /// Polynomial coefficients (highest power first) mapping a speed demand
    /// in meters/second to an engine setpoint in rpm.
    pub speed_rpm_map_coeffs: Vec<f64>,
}
