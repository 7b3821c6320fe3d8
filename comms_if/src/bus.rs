//! # Actuator bus interface
//!
//! The vessel's actuators and kinematic sensors sit on a CAN-style bus with
//! fixed frame identifiers and payload layouts. This module defines those
//! layouts and the codecs between engineering units and raw frames.
//!
//! Outbound channels:
//!
//! | Channel    | Id    | Payload                                        |
//! |------------|-------|------------------------------------------------|
//! | Rudder     | 0x200 | 1 byte, signed rudder angle in degrees x10     |
//! | Propulsion | 0x201 | 2 bytes, big-endian unsigned setpoint (rpm)    |
//!
//! Inbound channels:
//!
//! | Channel         | Id    | Payload                                   |
//! |-----------------|-------|-------------------------------------------|
//! | Velocity        | 0x100 | 3 bytes, u/v/r, signed, value / 10        |
//! | Rudder feedback | 0x101 | 1 byte, signed angle / 10                 |
//! | Engine feedback | 0x102 | 2 bytes, big-endian unsigned rpm          |

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Outbound rudder demand channel identifier.
pub const RUDDER_DEM_ID: u16 = 0x200;

/// Outbound propulsion demand channel identifier.
pub const PROP_DEM_ID: u16 = 0x201;

/// Inbound body-frame velocity telemetry channel identifier.
pub const VELOCITY_TM_ID: u16 = 0x100;

/// Inbound rudder angle feedback channel identifier.
pub const RUDDER_TM_ID: u16 = 0x101;

/// Inbound engine rpm feedback channel identifier.
pub const ENGINE_TM_ID: u16 = 0x102;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A single raw frame on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusFrame {
    /// Channel identifier
    pub id: u16,

    /// Raw payload bytes
    pub data: Vec<u8>,
}

/// Actuator demands produced by the guidance controller each cycle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorDems {
    /// Rudder angle demand in degrees, positive to starboard.
    pub rudder_angle_deg: f64,

    /// Propulsion setpoint in revolutions per minute.
    pub prop_rpm: u16,
}

/// Kinematic telemetry read back from the bus.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KinTm {
    /// Surge velocity in meters/second.
    pub u_ms: f64,

    /// Sway velocity in meters/second.
    pub v_ms: f64,

    /// Yaw rate in radians/second.
    pub r_rads: f64,

    /// Rudder angle feedback in degrees.
    pub rudder_angle_deg: f64,

    /// Engine speed feedback in revolutions per minute.
    pub engine_rpm: u16,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while encoding or decoding bus frames.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Frame id 0x{0:03X} is not a known telemetry channel")]
    UnknownChannel(u16),

    #[error("Frame 0x{id:03X} carries {found} payload bytes, expected {expected}")]
    PayloadLength {
        id: u16,
        expected: usize,
        found: usize,
    },

    #[error("The bus transport reported an error: {0}")]
    Transport(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A connector onto the actuator bus.
///
/// The transport behind this trait (socketcan, serial bridge, simulation) is
/// an equipment-side concern. Implementations must not block in
/// `poll_telemetry`, a call with nothing pending returns an empty vector.
pub trait BusConnector {
    /// Send the actuator demand frames for this cycle.
    fn send_dems(&mut self, dems: &ActuatorDems) -> Result<(), BusError>;

    /// Return all telemetry frames received since the last poll.
    fn poll_telemetry(&mut self) -> Result<Vec<BusFrame>, BusError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ActuatorDems {
    /// A demand which moves nothing: rudder amidships, zero propulsion.
    pub fn neutral() -> Self {
        Self {
            rudder_angle_deg: 0.0,
            prop_rpm: 0,
        }
    }

    /// Encode the demands into their outbound frames.
    ///
    /// The rudder byte is the angle in degrees x10, truncated to the low
    /// byte as the helm electronics expect.
    pub fn to_frames(&self) -> [BusFrame; 2] {
        let rudder_raw = (self.rudder_angle_deg * 10.0) as i32 as u8;

        let mut prop_data = [0u8; 2];
        BigEndian::write_u16(&mut prop_data, self.prop_rpm);

        [
            BusFrame {
                id: RUDDER_DEM_ID,
                data: vec![rudder_raw],
            },
            BusFrame {
                id: PROP_DEM_ID,
                data: prop_data.to_vec(),
            },
        ]
    }
}

impl KinTm {
    /// Apply a single inbound telemetry frame to this record.
    ///
    /// Fields not carried by the frame are left untouched, so a `KinTm` can
    /// be accumulated over a burst of frames.
    pub fn apply_frame(&mut self, frame: &BusFrame) -> Result<(), BusError> {
        match frame.id {
            VELOCITY_TM_ID => {
                check_len(frame, 3)?;
                self.u_ms = (frame.data[0] as i8) as f64 / 10.0;
                self.v_ms = (frame.data[1] as i8) as f64 / 10.0;
                self.r_rads = (frame.data[2] as i8) as f64 / 10.0;
            }
            RUDDER_TM_ID => {
                check_len(frame, 1)?;
                self.rudder_angle_deg = (frame.data[0] as i8) as f64 / 10.0;
            }
            ENGINE_TM_ID => {
                check_len(frame, 2)?;
                self.engine_rpm = BigEndian::read_u16(&frame.data);
            }
            id => return Err(BusError::UnknownChannel(id)),
        }

        Ok(())
    }

    /// Build a telemetry record from a burst of frames.
    pub fn from_frames(frames: &[BusFrame]) -> Result<Self, BusError> {
        let mut tm = Self::default();
        for frame in frames {
            tm.apply_frame(frame)?;
        }
        Ok(tm)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn check_len(frame: &BusFrame, expected: usize) -> Result<(), BusError> {
    if frame.data.len() != expected {
        Err(BusError::PayloadLength {
            id: frame.id,
            expected,
            found: frame.data.len(),
        })
    }
    else {
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_actuator_frame_layout() {
        let dems = ActuatorDems {
            rudder_angle_deg: 12.3,
            prop_rpm: 440,
        };
        let frames = dems.to_frames();

        assert_eq!(frames[0].id, RUDDER_DEM_ID);
        assert_eq!(frames[0].data, vec![123u8]);

        assert_eq!(frames[1].id, PROP_DEM_ID);
        // 440 = 0x01B8 big-endian
        assert_eq!(frames[1].data, vec![0x01, 0xB8]);
    }

    #[test]
    fn test_negative_rudder_encoding() {
        let dems = ActuatorDems {
            rudder_angle_deg: -5.0,
            prop_rpm: 0,
        };
        let frames = dems.to_frames();

        // -50 as a raw byte is the two's complement 0xCE
        assert_eq!(frames[0].data, vec![0xCEu8]);
    }

    #[test]
    fn test_telemetry_decode() {
        let frames = vec![
            BusFrame {
                id: VELOCITY_TM_ID,
                data: vec![15, 0xFBu8, 2],
            },
            BusFrame {
                id: RUDDER_TM_ID,
                data: vec![0xE2u8],
            },
            BusFrame {
                id: ENGINE_TM_ID,
                data: vec![0x01, 0xB8],
            },
        ];

        let tm = KinTm::from_frames(&frames).unwrap();

        assert!((tm.u_ms - 1.5).abs() < 1e-9);
        // 0xFB is -5 signed
        assert!((tm.v_ms + 0.5).abs() < 1e-9);
        assert!((tm.r_rads - 0.2).abs() < 1e-9);
        // 0xE2 is -30 signed
        assert!((tm.rudder_angle_deg + 3.0).abs() < 1e-9);
        assert_eq!(tm.engine_rpm, 440);
    }

    #[test]
    fn test_telemetry_rejects_bad_frames() {
        let mut tm = KinTm::default();

        assert!(matches!(
            tm.apply_frame(&BusFrame {
                id: 0x300,
                data: vec![]
            }),
            Err(BusError::UnknownChannel(0x300))
        ));

        assert!(matches!(
            tm.apply_frame(&BusFrame {
                id: VELOCITY_TM_ID,
                data: vec![1, 2]
            }),
            Err(BusError::PayloadLength { expected: 3, .. })
        ));
    }
}
