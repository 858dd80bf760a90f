//! Candidate viewpoints: observer poses for the projection mode and sky
//! coordinates for the rendered mode.

use std::fmt;

use crate::Vector3;

/// Viewing orientation as three angles in degrees.
///
/// Stored in the order `(pitch, roll, yaw)`; yaw is the rotation about +Z and
/// is the only angle the default projector applies.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub yaw_deg: f64,
}

impl Orientation {
    pub fn new(pitch_deg: f64, roll_deg: f64, yaw_deg: f64) -> Self {
        Self {
            pitch_deg,
            roll_deg,
            yaw_deg,
        }
    }

    /// Orientation with only a yaw component.
    pub fn from_yaw(yaw_deg: f64) -> Self {
        Self::new(0.0, 0.0, yaw_deg)
    }

    /// Build from a `[pitch, roll, yaw]` triple.
    pub fn from_degrees(angles: [f64; 3]) -> Self {
        Self::new(angles[0], angles[1], angles[2])
    }

    pub fn to_degrees(&self) -> [f64; 3] {
        [self.pitch_deg, self.roll_deg, self.yaw_deg]
    }
}

/// Observer position (light-years) and viewing orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverPose {
    pub position: Vector3,
    pub orientation: Orientation,
}

impl ObserverPose {
    pub fn new(position: Vector3, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at the origin facing yaw 0.
    pub fn origin() -> Self {
        Self::new(Vector3::zeros(), Orientation::default())
    }
}

impl fmt::Display for ObserverPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [p, r, y] = self.orientation.to_degrees();
        write!(
            f,
            "position ({}, {}, {}) ly, orientation (pitch {p}°, roll {r}°, yaw {y}°)",
            self.position.x, self.position.y, self.position.z
        )
    }
}

/// Direction on the sky used to aim the external renderer, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkyCoordinate {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
}

impl SkyCoordinate {
    pub fn new(longitude_deg: f64, latitude_deg: f64) -> Self {
        Self {
            longitude_deg,
            latitude_deg,
        }
    }
}

impl fmt::Display for SkyCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "longitude {}°, latitude {}°",
            self.longitude_deg, self.latitude_deg
        )
    }
}
