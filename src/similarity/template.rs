//! Sum-of-squared-differences template matching between grayscale rasters.
//!
//! Candidate and observed images must have identical dimensions, so the
//! template fits at exactly one offset and the match reduces to
//! `Σ (observed − candidate)²`. Lower is better; identical images score 0.

use crate::error::ScoreError;
use crate::raster::GrayRaster;

use super::{ScoreDirection, Scorer};

/// SSD scorer for [`GrayRaster`]s.
///
/// A flat raster (no pixels, or every pixel equal) carries no star pattern and
/// scores `+∞`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumOfSquaredDifferences;

impl Scorer for SumOfSquaredDifferences {
    type Image = GrayRaster;

    fn direction(&self) -> ScoreDirection {
        ScoreDirection::Minimize
    }

    fn compare(&self, observed: &GrayRaster, candidate: &GrayRaster) -> Result<f64, ScoreError> {
        if observed.dimensions() != candidate.dimensions() {
            return Err(ScoreError::DimensionMismatch {
                observed: observed.dimensions(),
                candidate: candidate.dimensions(),
            });
        }
        if observed.is_flat() || candidate.is_flat() {
            return Ok(self.worst_score());
        }
        Ok(observed
            .pixels()
            .iter()
            .zip(candidate.pixels())
            .map(|(&a, &b)| {
                let d = a as f64 - b as f64;
                d * d
            })
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(w: usize, h: usize, pixels: &[f32]) -> GrayRaster {
        GrayRaster::new(w, h, pixels.to_vec()).unwrap()
    }

    #[test]
    fn identical_rasters_score_zero() {
        let a = raster(3, 2, &[0.0, 255.0, 10.0, 0.0, 0.0, 90.0]);
        assert_eq!(SumOfSquaredDifferences.compare(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn squared_differences_summed() {
        let a = raster(2, 2, &[0.0, 10.0, 0.0, 0.0]);
        let b = raster(2, 2, &[3.0, 10.0, 0.0, 4.0]);
        assert_eq!(SumOfSquaredDifferences.compare(&a, &b).unwrap(), 25.0);
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let a = raster(2, 3, &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let b = raster(3, 2, &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let err = SumOfSquaredDifferences.compare(&a, &b).unwrap_err();
        assert_eq!(
            err,
            ScoreError::DimensionMismatch {
                observed: (2, 3),
                candidate: (3, 2)
            }
        );
    }

    #[test]
    fn flat_raster_scores_worst() {
        let a = raster(2, 2, &[0.0, 10.0, 0.0, 0.0]);
        let flat = raster(2, 2, &[5.0; 4]);
        assert_eq!(SumOfSquaredDifferences.compare(&a, &flat).unwrap(), f64::INFINITY);
        assert_eq!(SumOfSquaredDifferences.compare(&flat, &a).unwrap(), f64::INFINITY);
        let empty = raster(0, 0, &[]);
        assert_eq!(SumOfSquaredDifferences.compare(&empty, &empty).unwrap(), f64::INFINITY);
    }
}
