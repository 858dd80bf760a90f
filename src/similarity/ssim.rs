//! Mean structural similarity (SSIM) between two occupancy grids.
//!
//! Follows the Wang et al. (2004) index with a uniform square window and
//! sample covariance, as `skimage.metrics.structural_similarity` computes it
//! with default options:
//!
//! ```text
//! S = (2·μx·μy + C1)(2·σxy + C2) / ((μx² + μy² + C1)(σx² + σy² + C2))
//! C1 = (K1·L)²,  C2 = (K2·L)²
//! ```
//!
//! The index is averaged over every window lying fully inside the grid.
//! Window sums come from summed-area tables, so cost is linear in the grid
//! area regardless of window size.

use crate::error::ScoreError;
use crate::raster::RasterPattern;

use super::{ScoreDirection, Scorer};

/// Parameters of the structural similarity index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsimConfig {
    /// Side of the square averaging window. Even values are reduced by one and
    /// the window is shrunk to fit grids smaller than it.
    /// Default: 7
    pub window_size: usize,
    /// Luminance stabilizer. Default: 0.01
    pub k1: f64,
    /// Contrast stabilizer. Default: 0.03
    pub k2: f64,
    /// Dynamic range of cell values. Default: 1.0
    pub data_range: f64,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            window_size: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: 1.0,
        }
    }
}

/// SSIM scorer for [`RasterPattern`]s. Higher is better; identical patterns
/// score 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralSimilarity {
    pub config: SsimConfig,
}

impl StructuralSimilarity {
    pub fn new(config: SsimConfig) -> Self {
        Self { config }
    }

    fn effective_window(&self, size: usize) -> usize {
        let mut w = self.config.window_size.min(size).max(1);
        if w % 2 == 0 {
            w -= 1;
        }
        w
    }
}

/// Summed-area table with a zero first row and column: entry `(r, c)` holds the
/// count of set cells in rows `< r` and columns `< c`.
struct SummedArea {
    stride: usize,
    sums: Vec<u32>,
}

impl SummedArea {
    fn build(size: usize, cell: impl Fn(usize) -> bool) -> Self {
        let stride = size + 1;
        let mut sums = vec![0u32; stride * stride];
        for r in 0..size {
            let mut row_sum = 0u32;
            for c in 0..size {
                row_sum += cell(r * size + c) as u32;
                sums[(r + 1) * stride + c + 1] = sums[r * stride + c + 1] + row_sum;
            }
        }
        Self { stride, sums }
    }

    /// Count inside the `w × w` window with top-left corner `(r, c)`.
    fn window(&self, r: usize, c: usize, w: usize) -> f64 {
        let s = self.stride;
        let total = self.sums[(r + w) * s + c + w] + self.sums[r * s + c];
        (total - self.sums[r * s + c + w] - self.sums[(r + w) * s + c]) as f64
    }
}

impl Scorer for StructuralSimilarity {
    type Image = RasterPattern;

    fn direction(&self) -> ScoreDirection {
        ScoreDirection::Maximize
    }

    fn worst_score(&self) -> f64 {
        -1.0
    }

    fn compare(&self, observed: &RasterPattern, candidate: &RasterPattern) -> Result<f64, ScoreError> {
        let n = observed.size();
        if candidate.size() != n {
            return Err(ScoreError::DimensionMismatch {
                observed: (n, n),
                candidate: (candidate.size(), candidate.size()),
            });
        }
        if observed.is_blank() || candidate.is_blank() {
            return Ok(self.worst_score());
        }

        let w = self.effective_window(n);
        let np = (w * w) as f64;
        let cov_norm = if np > 1.0 { np / (np - 1.0) } else { 1.0 };
        let c1 = (self.config.k1 * self.config.data_range).powi(2);
        let c2 = (self.config.k2 * self.config.data_range).powi(2);

        let x = observed.cells();
        let y = candidate.cells();
        let sx = SummedArea::build(n, |i| x[i]);
        let sy = SummedArea::build(n, |i| y[i]);
        let sxy = SummedArea::build(n, |i| x[i] && y[i]);

        // Cells are 0/1, so Σx² = Σx and Σy² = Σy.
        let span = n - w + 1;
        let mut total = 0.0f64;
        for r in 0..span {
            for c in 0..span {
                let ux = sx.window(r, c, w) / np;
                let uy = sy.window(r, c, w) / np;
                let uxy = sxy.window(r, c, w) / np;
                let vx = cov_norm * (ux - ux * ux);
                let vy = cov_norm * (uy - uy * uy);
                let vxy = cov_norm * (uxy - ux * uy);

                let a1 = 2.0 * ux * uy + c1;
                let a2 = 2.0 * vxy + c2;
                let b1 = ux * ux + uy * uy + c1;
                let b2 = vx + vy + c2;
                total += (a1 * a2) / (b1 * b2);
            }
        }
        Ok(total / (span * span) as f64)
    }
}
