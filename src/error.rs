//! Error kinds for every stage of a pose search.
//!
//! Catalog, render, search and score failures abort a run and surface through
//! [`Error`]. [`CandidateError`] is the per-candidate kind: the search
//! controller logs it, skips the candidate, and only fails the round when no
//! candidate survives.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Catalog or observed-image input could not be used.
#[derive(Debug, Error)]
pub enum DataError {
    /// The catalog source could not be opened or a record could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the catalog header.
    #[error("catalog {path} has no column named {column:?}")]
    MissingColumn { path: PathBuf, column: String },

    /// Every row was filtered out (or the file had none).
    #[error("catalog {path} contains no valid rows")]
    Empty { path: PathBuf },

    /// Filesystem failure while reading or writing a cached catalog.
    #[error("catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cached catalog could not be (de)serialized.
    #[error("catalog cache {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The observed sky image could not be opened or decoded.
    #[error("failed to load observed image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// The external renderer could not produce its batch.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot create render output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write render script {path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start renderer {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for renderer: {0}")]
    Wait(#[source] std::io::Error),

    #[error("renderer did not finish within {0:?}")]
    Timeout(Duration),

    #[error("renderer produced no output directory at {path}")]
    NoOutput { path: PathBuf },
}

/// A search round could not select a winner.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The round had no candidates, e.g. a grid with `half_extent <= 0`.
    #[error("round {round} has an empty candidate set")]
    EmptyCandidateSet { round: usize },

    #[error("round {round}: none of the {attempted} candidates produced a usable image")]
    NoViableCandidates { round: usize, attempted: usize },

    #[error("round {round} was cancelled")]
    Cancelled { round: usize },

    #[error("search configuration has no rounds")]
    NoRounds,

    #[error("invalid candidate grid: {0}")]
    InvalidGrid(String),
}

/// Two images cannot be compared.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    /// Observed and candidate representations differ in size. Dimensions are
    /// (width, height); square occupancy grids report their side twice.
    #[error("observed image is {observed:?} but candidate is {candidate:?}")]
    DimensionMismatch {
        observed: (usize, usize),
        candidate: (usize, usize),
    },
}

/// Failure to obtain or score one candidate. Recovered by skipping it.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("renderer returned no image for {candidate}")]
    NotRendered { candidate: String },

    #[error("expected rendered image {path} does not exist")]
    MissingImage { path: PathBuf },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Run-level failure, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("data stage failed: {0}")]
    Data(#[from] DataError),

    #[error("render stage failed: {0}")]
    Render(#[from] RenderError),

    #[error("search stage failed: {0}")]
    Search(#[from] SearchError),

    #[error("scoring stage failed: {0}")]
    Score(#[from] ScoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
