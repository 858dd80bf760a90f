//! Projection of the 3D catalog into the 2D star pattern seen from a pose.
//!
//! # Pipeline
//!
//! ```text
//! star → subtract observer position → rotate by orientation → keep (x, y)
//! ```
//!
//! The projection is orthographic onto the rotated XY plane: there is no
//! perspective divide, no field-of-view clipping and no culling, so every
//! input star yields exactly one output point, in input order.

use nalgebra::Rotation3;

use crate::pose::{ObserverPose, Orientation};
use crate::{Matrix3, Star, Vector3};

/// Which orientation angles the projector applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationModel {
    /// Rotate about +Z by yaw only; pitch and roll are carried but ignored.
    #[default]
    YawOnly,
    /// Roll about X, then pitch about Y, then yaw about Z.
    Full,
}

/// A star pattern as two parallel coordinate sequences, one entry per star.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectedImage {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl ProjectedImage {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate over `(x, y)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Rotation about +Z by `yaw_deg`, counter-clockwise in the XY plane.
pub fn yaw_rotation(yaw_deg: f64) -> Matrix3 {
    let (s, c) = yaw_deg.to_radians().sin_cos();
    Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Stateless pose projector. Pure: identical inputs give identical outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseProjector {
    pub rotation: RotationModel,
}

impl PoseProjector {
    pub fn new(rotation: RotationModel) -> Self {
        Self { rotation }
    }

    /// Rotation matrix for `orientation` under this projector's model.
    pub fn rotation_matrix(&self, orientation: &Orientation) -> Matrix3 {
        match self.rotation {
            RotationModel::YawOnly => yaw_rotation(orientation.yaw_deg),
            RotationModel::Full => Rotation3::from_euler_angles(
                orientation.roll_deg.to_radians(),
                orientation.pitch_deg.to_radians(),
                orientation.yaw_deg.to_radians(),
            )
            .into_inner(),
        }
    }

    /// Star positions in the observer frame: translated, then rotated.
    pub fn transform(&self, pose: &ObserverPose, stars: &[Star]) -> Vec<Vector3> {
        let rot = self.rotation_matrix(&pose.orientation);
        stars
            .iter()
            .map(|s| rot * (s.position() - pose.position))
            .collect()
    }

    /// Project `stars` as seen from `pose`.
    pub fn project(&self, pose: &ObserverPose, stars: &[Star]) -> ProjectedImage {
        let (x, y) = self
            .transform(pose, stars)
            .iter()
            .map(|v| (v.x, v.y))
            .unzip();
        ProjectedImage { x, y }
    }

    /// Direction the observer faces: +Z rotated by the orientation.
    pub fn look_vector(&self, orientation: &Orientation) -> Vector3 {
        self.rotation_matrix(orientation) * Vector3::z()
    }
}
