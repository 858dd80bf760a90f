//! Candidate generation.
//!
//! A round's candidates form a square grid of `(2k + 1)²` points around a
//! center: `center + i·step` on the first axis and `center + j·step` on the
//! second, for `i, j ∈ [−k, k]`. Enumeration is row-major (first axis outer,
//! second inner); the search controller breaks ties by this order.

use crate::error::SearchError;
use crate::pose::{ObserverPose, SkyCoordinate};

/// Ordered candidates for one search round.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet<C> {
    candidates: Vec<C>,
}

impl<C> CandidateSet<C> {
    /// Use an explicit list, keeping its order.
    pub fn from_vec(candidates: Vec<C>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&C> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[C] {
        &self.candidates
    }

    pub fn into_vec(self) -> Vec<C> {
        self.candidates
    }
}

impl<C> FromIterator<C> for CandidateSet<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, C> IntoIterator for &'a CandidateSet<C> {
    type Item = &'a C;
    type IntoIter = std::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Row-major `(first, second)` offsets of a square grid.
///
/// Empty when `half_extent <= 0` or `step` is not a positive finite number;
/// both would produce a degenerate or duplicated grid.
pub fn grid_offsets(step: f64, half_extent: i32) -> Vec<(f64, f64)> {
    if half_extent <= 0 || !(step.is_finite() && step > 0.0) {
        return Vec::new();
    }
    let side = (2 * half_extent + 1) as usize;
    let mut offsets = Vec::with_capacity(side * side);
    for i in -half_extent..=half_extent {
        for j in -half_extent..=half_extent {
            offsets.push((i as f64 * step, j as f64 * step));
        }
    }
    offsets
}

/// Generates a round's candidates around a center.
pub trait CandidateGrid {
    type Coord;

    fn generate(&self, center: &Self::Coord, step: f64, half_extent: i32) -> CandidateSet<Self::Coord>;
}

/// Longitude × latitude grid for the external renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkyGrid;

impl CandidateGrid for SkyGrid {
    type Coord = SkyCoordinate;

    fn generate(&self, center: &SkyCoordinate, step: f64, half_extent: i32) -> CandidateSet<SkyCoordinate> {
        grid_offsets(step, half_extent)
            .into_iter()
            .map(|(dlon, dlat)| {
                SkyCoordinate::new(center.longitude_deg + dlon, center.latitude_deg + dlat)
            })
            .collect()
    }
}

/// One adjustable component of an [`ObserverPose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseAxis {
    PositionX,
    PositionY,
    PositionZ,
    Pitch,
    Roll,
    Yaw,
}

impl PoseAxis {
    /// Copy of `pose` with this component moved by `delta`.
    pub fn offset(self, pose: &ObserverPose, delta: f64) -> ObserverPose {
        let mut p = *pose;
        match self {
            PoseAxis::PositionX => p.position.x += delta,
            PoseAxis::PositionY => p.position.y += delta,
            PoseAxis::PositionZ => p.position.z += delta,
            PoseAxis::Pitch => p.orientation.pitch_deg += delta,
            PoseAxis::Roll => p.orientation.roll_deg += delta,
            PoseAxis::Yaw => p.orientation.yaw_deg += delta,
        }
        p
    }
}

/// Grid over two distinct pose components; all other components stay at the
/// center pose's values.
#[derive(Debug, Clone, Copy)]
pub struct PoseGrid {
    first: PoseAxis,
    second: PoseAxis,
}

impl PoseGrid {
    pub fn new(first: PoseAxis, second: PoseAxis) -> Result<Self, SearchError> {
        if first == second {
            return Err(SearchError::InvalidGrid(format!(
                "both grid axes are {first:?}"
            )));
        }
        Ok(Self { first, second })
    }

    pub fn axes(&self) -> (PoseAxis, PoseAxis) {
        (self.first, self.second)
    }
}

impl CandidateGrid for PoseGrid {
    type Coord = ObserverPose;

    fn generate(&self, center: &ObserverPose, step: f64, half_extent: i32) -> CandidateSet<ObserverPose> {
        grid_offsets(step, half_extent)
            .into_iter()
            .map(|(a, b)| self.second.offset(&self.first.offset(center, a), b))
            .collect()
    }
}
