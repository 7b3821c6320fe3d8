//! # ASV library
//!
//! This library allows other crates in the workspace (and the integration
//! tests) to access the items defined inside the ASV executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geodetic frames - projection between ellipsoidal, planar and body frames
pub mod geo;

/// Geofence engine - the operational boundary commanded moves are checked against
pub mod geofence;

/// Guidance module - the cyclic line-of-sight controller steering the vessel
pub mod guidance;

/// Mission configuration - turns mission.toml into the runtime fence and route
pub mod mission;

/// Simulation equipment - scripted GNSS and bus stand-ins for desk runs
pub mod sim;

/// Vessel state - the one shared model of where the vessel is and how it moves
pub mod vessel;
