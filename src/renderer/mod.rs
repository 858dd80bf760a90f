//! External star-field renderer interface.
//!
//! A [`Renderer`] turns a round's sky coordinates into one image file per
//! coordinate and reports where each file should be. It makes no promise that
//! every file exists: a missing file is a per-candidate failure handled by the
//! search controller.
//!
//! Rendered files are named `{prefix}_{longitude}_{latitude}.png`.

pub mod celestia;

pub use celestia::{write_script, CelestiaRenderer};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RenderError;
use crate::grid::CandidateSet;
use crate::pose::SkyCoordinate;

/// Parameters of the external renderer process.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Renderer executable, invoked as `<executable> --script <script>`.
    /// Default: `celestia`
    pub executable: PathBuf,
    /// Root directory for captures. Each round writes to `round_{n}` below it.
    /// Default: `celestia_starfields`
    pub output_dir: PathBuf,
    /// Script file name, written inside the round directory.
    /// Default: `celestia_script.txt`
    pub script_name: String,
    /// Capture file name prefix. Default: `starfield`
    pub file_prefix: String,
    /// Distance argument of every point-to command. Default: 10000
    pub distance: f64,
    /// Seconds the script waits after each capture. Default: 0.5
    pub capture_wait_s: f64,
    /// Kill the renderer if it runs longer than this. `None` waits forever.
    /// Default: 600 s
    pub timeout: Option<Duration>,
    /// How often to check whether the renderer has exited. Default: 100 ms
    pub poll_interval: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("celestia"),
            output_dir: PathBuf::from("celestia_starfields"),
            script_name: "celestia_script.txt".to_string(),
            file_prefix: "starfield".to_string(),
            distance: 10_000.0,
            capture_wait_s: 0.5,
            timeout: Some(Duration::from_secs(600)),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Expected image path for each rendered coordinate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedBatch {
    entries: Vec<(SkyCoordinate, PathBuf)>,
}

impl RenderedBatch {
    pub fn new(entries: Vec<(SkyCoordinate, PathBuf)>) -> Self {
        Self { entries }
    }

    /// Expected paths for `candidates` inside `dir`, named with `prefix`.
    pub fn expected(dir: &Path, prefix: &str, candidates: &CandidateSet<SkyCoordinate>) -> Self {
        Self::new(
            candidates
                .iter()
                .map(|c| (*c, dir.join(capture_file_name(prefix, c))))
                .collect(),
        )
    }

    /// Path recorded for `coord`, matched exactly.
    pub fn path_for(&self, coord: &SkyCoordinate) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(c, _)| c == coord)
            .map(|(_, p)| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(SkyCoordinate, PathBuf)] {
        &self.entries
    }
}

/// Produces star-field images for sky coordinates.
pub trait Renderer: Send + Sync {
    /// Render every candidate of round `round`.
    fn render(
        &self,
        round: usize,
        candidates: &CandidateSet<SkyCoordinate>,
    ) -> Result<RenderedBatch, RenderError>;
}

/// File name of the capture for `coord`.
pub fn capture_file_name(prefix: &str, coord: &SkyCoordinate) -> String {
    format!("{prefix}_{}_{}.png", coord.longitude_deg, coord.latitude_deg)
}

/// Recover the coordinate from a capture file name, or `None` if the name
/// does not follow `{prefix}_{longitude}_{latitude}.png`.
pub fn parse_capture_file_name(prefix: &str, name: &str) -> Option<SkyCoordinate> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('_')?;
    let rest = rest.strip_suffix(".png")?;
    let (lon, lat) = rest.split_once('_')?;
    if lat.contains('_') {
        return None;
    }
    Some(SkyCoordinate::new(lon.parse().ok()?, lat.parse().ok()?))
}

/// List the captures already present in `dir`, sorted by file name.
pub fn scan_rendered_directory(
    dir: impl AsRef<Path>,
    prefix: &str,
) -> Result<Vec<(SkyCoordinate, PathBuf)>, RenderError> {
    let dir = dir.as_ref();
    let read = std::fs::read_dir(dir).map_err(|_| RenderError::NoOutput {
        path: dir.to_path_buf(),
    })?;
    let mut found: Vec<(SkyCoordinate, PathBuf)> = read
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let name = path.file_name()?.to_str()?;
            let coord = parse_capture_file_name(prefix, name)?;
            Some((coord, path))
        })
        .collect();
    found.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(found)
}
