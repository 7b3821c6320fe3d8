//! # Communications interface library
//!
//! This crate defines the interfaces between the ASV software and its
//! external collaborators: the actuator/telemetry bus and the GNSS
//! position source. Only the wire formats and provider traits live here,
//! the transports themselves are supplied by the equipment side.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator bus interface - frame identifiers, payload codecs and the
/// connector trait.
pub mod bus;

/// GNSS interface - position/heading fix record and the source trait.
pub mod gnss;
