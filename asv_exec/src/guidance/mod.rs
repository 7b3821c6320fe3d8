//! # Guidance module
//!
//! The guidance module is the cyclic controller which steers the vessel
//! along its route. Each cycle it takes a snapshot of the shared vessel
//! state, evaluates the line-of-sight control law for the active route
//! segment and produces the actuator demands for the bus.
//!
//! The controller is a two-mode state machine:
//!
//! - `Tracking`: the vessel follows the active segment. The rudder demand
//!   is a heading PD term plus a cross-track PI term, and the speed demand
//!   ramps up towards cruise.
//! - `Turning`: entered on waypoint arrival. The cross-track terms are
//!   dropped, the vessel slows towards its minimum speed and swings onto
//!   the new segment course. Tracking resumes once the heading error and
//!   its rate are both small.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::{Guidance, StatusReport};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::geo::GeoError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The guidance controller's operating mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Following the active route segment under the full control law.
    Tracking,

    /// Swinging onto a new segment course after a waypoint arrival.
    Turning,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Tracking
    }
}

/// Errors which can occur during guidance initialisation.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Cannot load the guidance parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Cannot create the guidance archive: {0}")]
    ArchiveError(String),
}

/// Errors which can occur during cyclic processing.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("Guidance has not been initialised")]
    NotInitialised,

    #[error("Geodetic error in the control law: {0}")]
    GeoError(#[from] GeoError),
}
