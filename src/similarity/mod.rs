//! Image similarity scoring.
//!
//! Two strategies share the [`Scorer`] trait:
//!
//! - [`StructuralSimilarity`]: windowed SSIM between binary occupancy grids
//!   ([`RasterPattern`](crate::RasterPattern)); higher is better, range
//!   `[-1, 1]`.
//! - [`SumOfSquaredDifferences`]: template match between equally sized
//!   grayscale rasters ([`GrayRaster`](crate::GrayRaster)); lower is better,
//!   range `[0, ∞]`.
//!
//! Scorers are pure. Degenerate inputs never fail: they score
//! [`ScoreDirection::worst`]. Only a size mismatch is an error.

pub mod ssim;
pub mod template;

pub use ssim::{SsimConfig, StructuralSimilarity};
pub use template::SumOfSquaredDifferences;

use crate::error::ScoreError;

/// Which end of a metric is the better match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreDirection {
    Maximize,
    Minimize,
}

impl ScoreDirection {
    /// `true` if `candidate` is strictly better than `best`. NaN is never
    /// better, so ties and NaN keep the incumbent.
    pub fn is_improvement(self, candidate: f64, best: f64) -> bool {
        match self {
            ScoreDirection::Maximize => candidate > best,
            ScoreDirection::Minimize => candidate < best,
        }
    }

    /// Worst score under this direction.
    pub fn worst(self) -> f64 {
        match self {
            ScoreDirection::Maximize => f64::NEG_INFINITY,
            ScoreDirection::Minimize => f64::INFINITY,
        }
    }
}

/// Compares an observed image against a candidate image.
pub trait Scorer: Send + Sync {
    /// Comparable representation consumed by this scorer.
    type Image;

    /// Whether higher or lower scores are better.
    fn direction(&self) -> ScoreDirection;

    /// Worst score this metric can produce. Returned for degenerate inputs.
    fn worst_score(&self) -> f64 {
        self.direction().worst()
    }

    /// Score `candidate` against `observed`.
    fn compare(&self, observed: &Self::Image, candidate: &Self::Image) -> Result<f64, ScoreError>;
}
