use rkyv::{Archive, Deserialize, Serialize};

use crate::Vector3;

/// A star as a fixed point in 3D space.
/// Coordinates are heliocentric Cartesian in light-years, with +X toward
/// RA 0°, +Z toward the north celestial pole.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Star {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Position as a column vector.
    pub fn position(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    /// `true` when every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Convert a spherical catalog position to a Cartesian star.
///
/// `ra_deg` / `dec_deg` are right ascension and declination in degrees,
/// `distance` is in light-years:
///
/// ```text
/// x = d·cos(ra)·cos(dec)
/// y = d·sin(ra)·cos(dec)
/// z = d·sin(dec)
/// ```
pub fn star_from_spherical(ra_deg: f64, dec_deg: f64, distance: f64) -> Star {
    let (rasin, racos) = ra_deg.to_radians().sin_cos();
    let (decsin, deccos) = dec_deg.to_radians().sin_cos();
    Star {
        x: distance * racos * deccos,
        y: distance * rasin * deccos,
        z: distance * decsin,
    }
}
