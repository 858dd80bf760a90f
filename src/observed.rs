//! Loading sky images from disk.
//!
//! Images of any format supported by the `image` crate are converted to 8-bit
//! luma. For structural-similarity scoring the luma image is thresholded into
//! star pixels; for template matching it is kept as a [`GrayRaster`].

use std::path::Path;

use tracing::debug;

use crate::error::DataError;
use crate::raster::{GrayRaster, RasterConfig, RasterPattern};

/// Parameters for turning an observed photograph into star pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedImageConfig {
    /// Pixels with luma strictly greater than this are stars.
    /// Default: 200
    pub threshold: u8,
}

impl Default for ObservedImageConfig {
    fn default() -> Self {
        Self { threshold: 200 }
    }
}

/// Open an image file as 8-bit grayscale.
pub fn load_gray_raster(path: impl AsRef<Path>) -> Result<GrayRaster, image::ImageError> {
    let img = image::open(path.as_ref())?;
    Ok(GrayRaster::from_luma8(&img.to_luma8()))
}

/// Coordinates `(row, column)` of every pixel brighter than `threshold`,
/// in row-major order.
pub fn star_pixels(raster: &GrayRaster, threshold: u8) -> Vec<(u32, u32)> {
    let width = raster.width();
    let threshold = threshold as f32;
    raster
        .pixels()
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v > threshold)
        .map(|(i, _)| ((i / width) as u32, (i % width) as u32))
        .collect()
}

/// Load the observed photograph as a grayscale raster (template-match mode).
pub fn load_observed_raster(path: impl AsRef<Path>) -> Result<GrayRaster, DataError> {
    load_gray_raster(path.as_ref()).map_err(|source| DataError::Image {
        path: path.as_ref().to_path_buf(),
        source,
    })
}

/// Load the observed photograph as an occupancy grid (structural-similarity
/// mode).
pub fn load_observed_pattern(
    path: impl AsRef<Path>,
    config: &ObservedImageConfig,
    raster: &RasterConfig,
) -> Result<RasterPattern, DataError> {
    let gray = load_observed_raster(path.as_ref())?;
    let stars = star_pixels(&gray, config.threshold);
    debug!(
        "Observed image {}x{}: {} pixels above threshold {}",
        gray.width(),
        gray.height(),
        stars.len(),
        config.threshold
    );
    Ok(RasterPattern::from_pixels(&stars, raster))
}
