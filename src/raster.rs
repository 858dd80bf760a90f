//! Comparable image representations.
//!
//! - [`RasterPattern`]: square binary occupancy grid built from star points.
//! - [`GrayRaster`]: grayscale pixel buffer read from a rendered or observed
//!   image file.
//!
//! # Point → cell mapping
//!
//! A coordinate `v` lands in cell `trunc(v · scale + origin) mod size`, where
//! truncation is toward zero and the modulo is Euclidean (always in
//! `[0, size)`). So with the default `scale = 1`, `origin = 0`, `size = 1000`:
//! `3.9 → 3`, `-0.5 → 0`, `-1.2 → 999`, `1000.0 → 0`. Distinct points may share
//! a cell; non-finite coordinates are dropped.

use crate::projector::ProjectedImage;

/// Geometry of the occupancy grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterConfig {
    /// Side length of the square grid in cells. Default 1000.
    pub size: usize,
    /// Offset added to each scaled coordinate before truncation, as
    /// `[row, column]`. Default `[0.0, 0.0]`.
    pub origin: [f64; 2],
    /// Multiplier applied to each coordinate before the origin offset.
    /// Default 1.0.
    pub scale: f64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            origin: [0.0, 0.0],
            scale: 1.0,
        }
    }
}

/// Axis of the occupancy grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterAxis {
    Row,
    Column,
}

impl RasterConfig {
    fn origin(&self, axis: RasterAxis) -> f64 {
        match axis {
            RasterAxis::Row => self.origin[0],
            RasterAxis::Column => self.origin[1],
        }
    }

    /// Cell index along one axis, or `None` for a non-finite coordinate or an
    /// empty grid.
    pub fn cell(&self, value: f64, axis: RasterAxis) -> Option<usize> {
        if self.size == 0 {
            return None;
        }
        let t = (value * self.scale + self.origin(axis)).trunc();
        if !t.is_finite() {
            return None;
        }
        Some((t as i64).rem_euclid(self.size as i64) as usize)
    }
}

/// Square binary occupancy grid, stored row-major.
///
/// The first point coordinate selects the row, the second the column.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPattern {
    size: usize,
    cells: Vec<bool>,
    occupied: usize,
}

impl RasterPattern {
    /// All-off grid.
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
            occupied: 0,
        }
    }

    /// Rasterize arbitrary `(row, column)` coordinates.
    pub fn from_points<I>(points: I, config: &RasterConfig) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut pattern = Self::empty(config.size);
        for (a, b) in points {
            let row = config.cell(a, RasterAxis::Row);
            let col = config.cell(b, RasterAxis::Column);
            if let (Some(r), Some(c)) = (row, col) {
                pattern.set(r, c);
            }
        }
        pattern
    }

    /// Rasterize a projected star pattern: x selects the row, y the column.
    pub fn from_projected(image: &ProjectedImage, config: &RasterConfig) -> Self {
        Self::from_points(image.points(), config)
    }

    /// Rasterize observed star pixels given as `(row, column)`.
    pub fn from_pixels(pixels: &[(u32, u32)], config: &RasterConfig) -> Self {
        Self::from_points(
            pixels.iter().map(|&(r, c)| (r as f64, c as f64)),
            config,
        )
    }

    fn set(&mut self, row: usize, col: usize) {
        let cell = &mut self.cells[row * self.size + col];
        if !*cell {
            *cell = true;
            self.occupied += 1;
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_set(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.cells[row * self.size + col]
    }

    /// Number of cells switched on.
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// `true` when no cell is on.
    pub fn is_blank(&self) -> bool {
        self.occupied == 0
    }

    /// Row-major cell values.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }
}

/// Grayscale image with intensities in `[0, 255]`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayRaster {
    width: usize,
    height: usize,
    pixels: Vec<f32>,
}

impl GrayRaster {
    /// Wrap row-major pixels. Returns `None` if the length does not match.
    pub fn new(width: usize, height: usize, pixels: Vec<f32>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_luma8(img: &image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            pixels: img.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        (row < self.height && col < self.width).then(|| self.pixels[row * self.width + col])
    }

    /// `true` when there are no pixels or every pixel has the same value.
    pub fn is_flat(&self) -> bool {
        match self.pixels.first() {
            None => true,
            Some(&first) => self.pixels.iter().all(|&v| v == first),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_mapping_truncates_and_wraps() {
        let cfg = RasterConfig::default();
        assert_eq!(cfg.cell(3.9, RasterAxis::Row), Some(3));
        assert_eq!(cfg.cell(-0.5, RasterAxis::Row), Some(0));
        assert_eq!(cfg.cell(-1.2, RasterAxis::Row), Some(999));
        assert_eq!(cfg.cell(1000.0, RasterAxis::Row), Some(0));
        assert_eq!(cfg.cell(2345.0, RasterAxis::Column), Some(345));
        assert_eq!(cfg.cell(f64::NAN, RasterAxis::Row), None);
        assert_eq!(cfg.cell(f64::INFINITY, RasterAxis::Column), None);
    }

    #[test]
    fn origin_and_scale_shift_cells() {
        let cfg = RasterConfig {
            size: 100,
            origin: [50.0, 10.0],
            scale: 0.5,
        };
        assert_eq!(cfg.cell(-20.0, RasterAxis::Row), Some(40));
        assert_eq!(cfg.cell(-20.0, RasterAxis::Column), Some(0));
        assert_eq!(cfg.cell(-40.0, RasterAxis::Column), Some(90));
    }

    #[test]
    fn aliasing_points_share_a_cell() {
        let cfg = RasterConfig {
            size: 10,
            ..Default::default()
        };
        let p = RasterPattern::from_points([(1.2, 3.0), (11.9, 13.5), (1.0, -7.0)], &cfg);
        assert_eq!(p.occupied(), 1);
        assert!(p.is_set(1, 3));
    }

    #[test]
    fn projected_x_is_row_y_is_column() {
        let img = ProjectedImage {
            x: vec![2.0, -1.0],
            y: vec![5.0, 0.0],
        };
        let cfg = RasterConfig {
            size: 8,
            ..Default::default()
        };
        let p = RasterPattern::from_projected(&img, &cfg);
        assert!(p.is_set(2, 5));
        assert!(p.is_set(7, 0));
        assert!(!p.is_set(5, 2));
        assert_eq!(p.occupied(), 2);
    }

    #[test]
    fn empty_inputs_give_blank_pattern() {
        let p = RasterPattern::from_projected(&ProjectedImage::default(), &RasterConfig::default());
        assert!(p.is_blank());
        assert_eq!(p.size(), 1000);
        let p = RasterPattern::from_pixels(&[], &RasterConfig { size: 0, ..Default::default() });
        assert!(p.is_blank());
    }

    #[test]
    fn gray_raster_flatness() {
        assert!(GrayRaster::new(2, 2, vec![7.0; 4]).unwrap().is_flat());
        assert!(!GrayRaster::new(2, 1, vec![0.0, 1.0]).unwrap().is_flat());
        assert!(GrayRaster::new(0, 0, vec![]).unwrap().is_flat());
        assert!(GrayRaster::new(3, 3, vec![0.0; 4]).is_none());
    }
}
