//! Image providers: how a candidate coordinate becomes a comparable image.
//!
//! - [`ProjectionProvider`] projects the catalog from an [`ObserverPose`] and
//!   rasterizes the result into a [`RasterPattern`].
//! - [`RenderedProvider`] asks a [`Renderer`] for a batch of captures once per
//!   round and then reads each capture from disk as a [`GrayRaster`].

use std::fmt::{self, Debug};
use std::sync::Arc;

use tracing::debug;

use crate::error::{CandidateError, RenderError};
use crate::grid::CandidateSet;
use crate::observed::load_gray_raster;
use crate::pose::{ObserverPose, SkyCoordinate};
use crate::projector::PoseProjector;
use crate::raster::{GrayRaster, RasterConfig, RasterPattern};
use crate::renderer::{RenderedBatch, Renderer};
use crate::StarCatalog;

/// Produces a comparable image for each candidate coordinate.
///
/// `produce` takes `&self` so a round may be evaluated in parallel.
pub trait ImageProvider: Send + Sync {
    type Coord: Clone + Debug + fmt::Display + Send + Sync;
    type Image: Send + Sync;

    /// Called once per round before any `produce` call.
    fn prepare(&mut self, _round: usize, _candidates: &CandidateSet<Self::Coord>) -> Result<(), RenderError> {
        Ok(())
    }

    /// Image for one candidate. Errors skip the candidate.
    fn produce(&self, coord: &Self::Coord) -> Result<Self::Image, CandidateError>;
}

/// Synthetic images from the catalog store.
#[derive(Debug, Clone)]
pub struct ProjectionProvider {
    catalog: Arc<StarCatalog>,
    projector: PoseProjector,
    raster: RasterConfig,
}

impl ProjectionProvider {
    pub fn new(catalog: Arc<StarCatalog>, projector: PoseProjector, raster: RasterConfig) -> Self {
        Self {
            catalog,
            projector,
            raster,
        }
    }

    pub fn catalog(&self) -> &StarCatalog {
        &self.catalog
    }

    pub fn projector(&self) -> &PoseProjector {
        &self.projector
    }

    pub fn raster(&self) -> &RasterConfig {
        &self.raster
    }
}

impl ImageProvider for ProjectionProvider {
    type Coord = ObserverPose;
    type Image = RasterPattern;

    fn produce(&self, pose: &ObserverPose) -> Result<RasterPattern, CandidateError> {
        let projected = self.projector.project(pose, self.catalog.stars());
        Ok(RasterPattern::from_projected(&projected, &self.raster))
    }
}

/// Captured images from an external renderer.
#[derive(Debug)]
pub struct RenderedProvider<R> {
    renderer: R,
    batch: RenderedBatch,
}

impl<R: Renderer> RenderedProvider<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            batch: RenderedBatch::default(),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Captures reported by the most recent round.
    pub fn batch(&self) -> &RenderedBatch {
        &self.batch
    }
}

impl<R: Renderer> ImageProvider for RenderedProvider<R> {
    type Coord = SkyCoordinate;
    type Image = GrayRaster;

    fn prepare(&mut self, round: usize, candidates: &CandidateSet<SkyCoordinate>) -> Result<(), RenderError> {
        self.batch = self.renderer.render(round, candidates)?;
        debug!("Renderer reported {} captures for round {}", self.batch.len(), round);
        Ok(())
    }

    fn produce(&self, coord: &SkyCoordinate) -> Result<GrayRaster, CandidateError> {
        let path = self
            .batch
            .path_for(coord)
            .ok_or_else(|| CandidateError::NotRendered {
                candidate: coord.to_string(),
            })?;
        if !path.is_file() {
            return Err(CandidateError::MissingImage {
                path: path.to_path_buf(),
            });
        }
        load_gray_raster(path).map_err(|source| CandidateError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}
