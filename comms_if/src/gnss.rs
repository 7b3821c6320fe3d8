//! # GNSS interface
//!
//! The position/heading provider is an external collaborator. This module
//! defines the fix record it delivers and the trait the ASV software
//! consumes it through.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A single position/heading fix from the GNSS receiver.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in degrees (WGS84)
    pub lat_deg: f64,

    /// Longitude in degrees (WGS84)
    pub lon_deg: f64,

    /// Heading in radians from true north, positive towards east, if the
    /// receiver could derive one.
    pub heading_rad: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of GNSS fixes.
///
/// Implementations must return within the given timeout: either a valid fix
/// or `None` for "no fix available". The position-refresh loop treats `None`
/// as a degraded-fix condition, retaining the previous position.
pub trait GnssSource {
    /// Get the latest fix, waiting at most `timeout`.
    fn get_fix(&mut self, timeout: Duration) -> Option<Fix>;
}
