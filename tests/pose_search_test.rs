//! Integration tests: project a catalog from a known pose, treat the result as
//! the observed image, and check that the search recovers the pose. The
//! rendered mode is driven by a fake renderer that writes PNG fixtures.

use std::path::PathBuf;
use std::sync::Arc;

use approx::assert_relative_eq;
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use starpose::{
    capture_file_name, load_observed_pattern, scan_rendered_directory, CandidateSet, Error,
    ObservedImageConfig, ObserverPose, Orientation, PoseAxis, PoseGrid, PoseProjector,
    ProjectionProvider, RasterConfig, RasterPattern, RenderError, RenderedBatch, RenderedProvider,
    Renderer, RoundSpec, ScoreError, SearchConfig, SearchController, SearchError, SkyCoordinate,
    SkyGrid, SsimConfig, Star, StarCatalog, StructuralSimilarity, SumOfSquaredDifferences, Vector3,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}

fn three_star_catalog() -> Arc<StarCatalog> {
    Arc::new(StarCatalog::new(vec![
        Star::new(10.0, 0.0, 0.0),
        Star::new(0.0, 10.0, 0.0),
        Star::new(0.0, 0.0, 10.0),
    ]))
}

fn random_catalog(seed: u64, n: usize) -> Arc<StarCatalog> {
    let mut rng = StdRng::seed_from_u64(seed);
    let stars = (0..n)
        .map(|_| {
            Star::new(
                rng.random_range(-60.0..60.0),
                rng.random_range(-60.0..60.0),
                rng.random_range(-60.0..60.0),
            )
        })
        .collect();
    Arc::new(StarCatalog::new(stars))
}

/// Write `pattern` as a black image with one white pixel per occupied cell.
fn write_pattern_png(pattern: &RasterPattern, path: &std::path::Path) {
    let n = pattern.size() as u32;
    let mut img = GrayImage::new(n, n);
    for row in 0..pattern.size() {
        for col in 0..pattern.size() {
            if pattern.is_set(row, col) {
                img.put_pixel(col as u32, row as u32, Luma([255]));
            }
        }
    }
    img.save(path).unwrap();
}

/// Yaw sweep from the origin over a three-star catalog picks yaw 0, the pose
/// the observed image was taken from.
#[test]
fn test_yaw_sweep_recovers_observed_pose() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let raster = RasterConfig {
        size: 64,
        ..Default::default()
    };
    let catalog = three_star_catalog();
    let projector = PoseProjector::default();

    // Observed image goes through a PNG on disk like a real photograph.
    let truth = ObserverPose::origin();
    let expected = RasterPattern::from_projected(&projector.project(&truth, catalog.stars()), &raster);
    assert_eq!(expected.occupied(), 3);
    let observed_path = dir.path().join("observed.png");
    write_pattern_png(&expected, &observed_path);
    let observed =
        load_observed_pattern(&observed_path, &ObservedImageConfig::default(), &raster).unwrap();
    assert_eq!(observed, expected);

    let provider = ProjectionProvider::new(catalog, projector, raster);
    let scorer = StructuralSimilarity::new(SsimConfig::default());
    let mut controller = SearchController::new(provider, scorer, SearchConfig::default());

    let candidates: CandidateSet<ObserverPose> = [-90.0, -45.0, 0.0, 45.0, 90.0]
        .into_iter()
        .map(|yaw| ObserverPose::new(Vector3::zeros(), Orientation::from_yaw(yaw)))
        .collect();
    let result = controller.run_round(0, &candidates, &observed).unwrap();

    assert_eq!(result.best_index, 2);
    assert_eq!(result.best.orientation.yaw_deg, 0.0);
    assert_relative_eq!(result.score, 1.0, epsilon = 1e-12);
    assert_eq!(result.skipped, 0);
}

/// Coarse-to-fine over position x and yaw: every refine round scores at least
/// as well as the round before, and parallel evaluation picks the same poses.
#[test]
fn test_refinement_never_worsens() {
    init_logging();
    let raster = RasterConfig {
        size: 128,
        ..Default::default()
    };
    let catalog = random_catalog(42, 200);
    let projector = PoseProjector::default();
    let truth = ObserverPose::new(Vector3::new(23.0, 0.0, 0.0), Orientation::from_yaw(17.0));
    let observed = RasterPattern::from_projected(&projector.project(&truth, catalog.stars()), &raster);

    let grid = PoseGrid::new(PoseAxis::PositionX, PoseAxis::Yaw).unwrap();
    let rounds = vec![
        RoundSpec::new(10.0, 3),
        RoundSpec::new(2.0, 3),
        RoundSpec::new(1.0, 2),
    ];

    let run = |parallel: bool| {
        let provider = ProjectionProvider::new(catalog.clone(), projector, raster);
        let config = SearchConfig {
            rounds: rounds.clone(),
            parallel,
            ..Default::default()
        };
        let mut controller =
            SearchController::new(provider, StructuralSimilarity::new(SsimConfig::default()), config);
        controller.search(&grid, ObserverPose::origin(), &observed).unwrap()
    };

    let sequential = run(false);
    assert_eq!(sequential.rounds().len(), 3);
    for pair in sequential.rounds().windows(2) {
        assert!(
            pair[1].score >= pair[0].score,
            "round {} scored {} after {}",
            pair[1].round,
            pair[1].score,
            pair[0].score
        );
    }
    let attempted: Vec<usize> = sequential.rounds().iter().map(|r| r.attempted).collect();
    assert_eq!(attempted, vec![49, 49, 25]);
    assert!(sequential.final_match().score <= 1.0 + 1e-12);

    let parallel = run(true);
    for (s, p) in sequential.rounds().iter().zip(parallel.rounds()) {
        assert_eq!(s.best, p.best);
        assert_eq!(s.best_index, p.best_index);
        assert_eq!(s.score, p.score);
    }
}

/// Fake renderer that draws a bright block whose position encodes the
/// coordinate. Coordinates listed in `missing` are never written.
struct FixtureRenderer {
    dir: PathBuf,
    prefix: String,
    missing: Vec<SkyCoordinate>,
}

impl FixtureRenderer {
    fn new(dir: PathBuf, missing: Vec<SkyCoordinate>) -> Self {
        Self {
            dir,
            prefix: "starfield".to_string(),
            missing,
        }
    }
}

fn fixture_image(coord: &SkyCoordinate) -> GrayImage {
    let mut img = GrayImage::new(48, 48);
    let col = ((coord.longitude_deg + 20.0).rem_euclid(40.0) as u32) + 2;
    let row = ((coord.latitude_deg + 20.0).rem_euclid(40.0) as u32) + 2;
    for r in row..row + 4 {
        for c in col..col + 4 {
            img.put_pixel(c, r, Luma([230]));
        }
    }
    img
}

impl Renderer for FixtureRenderer {
    fn render(
        &self,
        round: usize,
        candidates: &CandidateSet<SkyCoordinate>,
    ) -> Result<RenderedBatch, RenderError> {
        let round_dir = self.dir.join(format!("round_{round}"));
        std::fs::create_dir_all(&round_dir).map_err(|source| RenderError::OutputDirectory {
            path: round_dir.clone(),
            source,
        })?;
        for c in candidates {
            if self.missing.contains(c) {
                continue;
            }
            let path = round_dir.join(capture_file_name(&self.prefix, c));
            fixture_image(c).save(&path).map_err(|_| RenderError::NoOutput {
                path: path.clone(),
            })?;
        }
        Ok(RenderedBatch::expected(&round_dir, &self.prefix, candidates))
    }
}

#[test]
fn test_rendered_search_skips_missing_captures() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let target = SkyCoordinate::new(10.0, -10.0);
    let observed = starpose::GrayRaster::from_luma8(&fixture_image(&target));

    let renderer = FixtureRenderer::new(
        dir.path().to_path_buf(),
        vec![SkyCoordinate::new(-10.0, -10.0), SkyCoordinate::new(0.0, 0.0)],
    );
    let config = SearchConfig {
        rounds: vec![RoundSpec::new(10.0, 1)],
        ..Default::default()
    };
    let mut controller =
        SearchController::new(RenderedProvider::new(renderer), SumOfSquaredDifferences, config);
    let outcome = controller
        .search(&SkyGrid, SkyCoordinate::new(0.0, 0.0), &observed)
        .unwrap();

    let best = outcome.final_match();
    assert_eq!(best.best, target);
    assert_eq!(best.score, 0.0);
    assert_eq!(best.attempted, 9);
    assert_eq!(best.skipped, 2);

    let captures = scan_rendered_directory(dir.path().join("round_0"), "starfield").unwrap();
    assert_eq!(captures.len(), 7);
    assert!(captures.iter().any(|(c, _)| *c == target));
}

#[test]
fn test_rendered_round_fails_when_every_capture_is_missing() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let candidates = CandidateSet::from_vec(vec![
        SkyCoordinate::new(0.0, 0.0),
        SkyCoordinate::new(5.0, 5.0),
    ]);
    let renderer = FixtureRenderer::new(dir.path().to_path_buf(), candidates.clone().into_vec());
    let observed = starpose::GrayRaster::from_luma8(&fixture_image(&SkyCoordinate::new(0.0, 0.0)));

    let mut controller = SearchController::new(
        RenderedProvider::new(renderer),
        SumOfSquaredDifferences,
        SearchConfig::default(),
    );
    let err = controller.run_round(0, &candidates, &observed).unwrap_err();
    assert!(matches!(
        err,
        Error::Search(SearchError::NoViableCandidates { round: 0, attempted: 2 })
    ));
}

#[test]
fn test_observed_size_mismatch_fails_at_scoring_stage() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let candidates = CandidateSet::from_vec(vec![
        SkyCoordinate::new(0.0, 0.0),
        SkyCoordinate::new(10.0, 0.0),
    ]);
    let renderer = FixtureRenderer::new(dir.path().to_path_buf(), Vec::new());
    // captures are 48x48, the photograph is smaller
    let mut photo = GrayImage::new(16, 16);
    photo.put_pixel(3, 4, Luma([250]));
    let observed = starpose::GrayRaster::from_luma8(&photo);

    let mut controller = SearchController::new(
        RenderedProvider::new(renderer),
        SumOfSquaredDifferences,
        SearchConfig::default(),
    );
    let err = controller.run_round(0, &candidates, &observed).unwrap_err();
    assert!(
        matches!(
            err,
            Error::Score(ScoreError::DimensionMismatch {
                observed: (16, 16),
                candidate: (48, 48)
            })
        ),
        "got {err:?}"
    );
    assert!(err.to_string().starts_with("scoring stage failed"));
}
