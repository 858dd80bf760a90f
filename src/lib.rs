//! # starpose
//!
//! Recover an observer's position and viewing orientation relative to a star
//! catalog by comparing a real sky photograph against synthetic star fields.
//!
//! Given one observed star-field image, `starpose` searches a grid of candidate
//! viewpoints, produces the star pattern each viewpoint would see, scores it
//! against the observation, and narrows the grid around the winner over several
//! rounds (coarse-to-fine).
//!
//! ## Operating modes
//!
//! - **Simulation**: candidate images are produced by projecting a 3D star
//!   catalog ([`StarCatalog`]) through a [`PoseProjector`], rasterized into
//!   binary occupancy grids and compared with windowed structural similarity
//!   ([`StructuralSimilarity`], higher is better).
//! - **Rendered**: candidate images are captured by an external planetarium
//!   program driven through a [`Renderer`], read back as grayscale rasters and
//!   compared by sum-of-squared-differences template matching
//!   ([`SumOfSquaredDifferences`], lower is better).
//!
//! Both modes plug into the same [`SearchController`] through the
//! [`ImageProvider`] and [`Scorer`] traits.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use starpose::{
//!     CatalogConfig, ObserverPose, PoseAxis, PoseGrid, PoseProjector, ProjectionProvider,
//!     RasterConfig, SearchConfig, SearchController, StarCatalog, StructuralSimilarity,
//!     SsimConfig, load_observed_pattern, ObservedImageConfig,
//! };
//!
//! let catalog = Arc::new(StarCatalog::from_gaia_csv("data/gaia.csv", &CatalogConfig::default()).unwrap());
//! let raster = RasterConfig::default();
//! let observed =
//!     load_observed_pattern("sky.png", &ObservedImageConfig::default(), &raster).unwrap();
//!
//! let provider = ProjectionProvider::new(catalog, PoseProjector::default(), raster);
//! let scorer = StructuralSimilarity::new(SsimConfig::default());
//! let mut controller = SearchController::new(provider, scorer, SearchConfig::default());
//!
//! let grid = PoseGrid::new(PoseAxis::PositionX, PoseAxis::Yaw).unwrap();
//! let outcome = controller.search(&grid, ObserverPose::origin(), &observed).unwrap();
//! let best = outcome.final_match();
//! println!("best pose {} with score {:.6}", best.best, best.score);
//! ```

pub(crate) mod catalogs;
pub mod error;
pub mod grid;
pub mod observed;
pub mod pose;
pub mod projector;
pub mod provider;
pub mod raster;
pub mod renderer;
pub mod search;
pub mod similarity;
pub mod star;
pub mod starcatalog;

pub use error::{CandidateError, DataError, Error, RenderError, ScoreError, SearchError};
pub use grid::{grid_offsets, CandidateGrid, CandidateSet, PoseAxis, PoseGrid, SkyGrid};
pub use observed::{
    load_gray_raster, load_observed_pattern, load_observed_raster, star_pixels, ObservedImageConfig,
};
pub use pose::{ObserverPose, Orientation, SkyCoordinate};
pub use projector::{yaw_rotation, PoseProjector, ProjectedImage, RotationModel};
pub use provider::{ImageProvider, ProjectionProvider, RenderedProvider};
pub use raster::{GrayRaster, RasterAxis, RasterConfig, RasterPattern};
pub use renderer::{
    capture_file_name, parse_capture_file_name, scan_rendered_directory, write_script,
    CelestiaRenderer, RenderedBatch, Renderer, RendererConfig,
};
pub use search::{
    CancelToken, MatchResult, RoundSpec, SearchConfig, SearchController, SearchOutcome,
    SearchStage,
};
pub use similarity::{ScoreDirection, Scorer, SsimConfig, StructuralSimilarity, SumOfSquaredDifferences};
pub use star::*;
pub use starcatalog::*;

// Catalog coordinates span thousands of light-years and the rotation tests
// need 1e-9 agreement, so everything geometric is f64.
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Matrix3 = nalgebra::Matrix3<f64>;
