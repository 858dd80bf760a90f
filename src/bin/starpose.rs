//! Command-line front end for star-field pose search.
//!
//! - `simulate`: project a star catalog from candidate poses and compare the
//!   occupancy grids against the observed image with SSIM.
//! - `render`: drive Celestia over a longitude/latitude grid and template
//!   match its captures against the observed image.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use starpose::{
    load_observed_pattern, load_observed_raster, CatalogConfig, CelestiaRenderer, GaiaColumns,
    ObservedImageConfig, ObserverPose, Orientation, PoseAxis, PoseGrid, PoseProjector,
    ProjectionProvider, RasterConfig, RenderedProvider, RendererConfig, RotationModel, RoundSpec,
    SearchConfig, SearchController, SearchOutcome, SkyCoordinate, SkyGrid, SsimConfig,
    StarCatalog, StructuralSimilarity, SumOfSquaredDifferences, Vector3,
};

/// Parse a round string in format "step:half_extent"
fn parse_round(s: &str) -> Result<RoundSpec, String> {
    let (step, half) = s
        .split_once(':')
        .ok_or_else(|| "Rounds must be in format 'step:half_extent'".to_string())?;
    let step = step
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid step value {step:?}"))?;
    let half_extent = half
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("Invalid half extent value {half:?}"))?;
    Ok(RoundSpec::new(step, half_extent))
}

#[derive(Parser, Debug)]
#[command(name = "starpose")]
#[command(about = "Estimate observer pose by matching a sky image against synthetic star fields")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
struct SearchArgs {
    /// Search rounds as "step:half_extent", coarse first (default 10:18 1:2)
    #[arg(long = "round", value_parser = parse_round)]
    rounds: Vec<RoundSpec>,

    /// Score each round's candidates on all cores
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

impl SearchArgs {
    fn to_config(&self) -> SearchConfig {
        let mut config = SearchConfig {
            parallel: self.parallel,
            ..Default::default()
        };
        if !self.rounds.is_empty() {
            config.rounds = self.rounds.clone();
        }
        config
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
    Z,
    Pitch,
    Roll,
    Yaw,
}

impl From<Axis> for PoseAxis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => PoseAxis::PositionX,
            Axis::Y => PoseAxis::PositionY,
            Axis::Z => PoseAxis::PositionZ,
            Axis::Pitch => PoseAxis::Pitch,
            Axis::Roll => PoseAxis::Roll,
            Axis::Yaw => PoseAxis::Yaw,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project a catalog from candidate poses and compare with SSIM
    Simulate {
        /// Catalog CSV export, or a `.rkyv` cache written with --save-cache
        #[arg(long)]
        catalog: PathBuf,

        /// Observed sky image
        #[arg(long)]
        observed: PathBuf,

        /// Write the parsed catalog to this `.rkyv` cache
        #[arg(long)]
        save_cache: Option<PathBuf>,

        /// Maximum number of catalog stars to keep
        #[arg(long, default_value_t = 100_000)]
        max_stars: usize,

        /// Right ascension column name
        #[arg(long, default_value = "RA_ICRS")]
        ra_column: String,

        /// Declination column name
        #[arg(long, default_value = "DE_ICRS")]
        dec_column: String,

        /// Distance column name
        #[arg(long, default_value = "Dist")]
        distance_column: String,

        /// Pixel brightness above which an observed pixel is a star
        #[arg(long, default_value_t = 200)]
        threshold: u8,

        /// Side length of the occupancy grid
        #[arg(long, default_value_t = 1000)]
        grid_size: usize,

        /// Multiplier applied to projected coordinates before gridding
        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        /// Starting position x
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        center_x: f64,

        /// Starting position y
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        center_y: f64,

        /// Starting position z
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        center_z: f64,

        /// Starting pitch in degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        center_pitch: f64,

        /// Starting roll in degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        center_roll: f64,

        /// Starting yaw in degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        center_yaw: f64,

        /// First grid axis
        #[arg(long, value_enum, default_value = "x")]
        first_axis: Axis,

        /// Second grid axis
        #[arg(long, value_enum, default_value = "yaw")]
        second_axis: Axis,

        /// Apply pitch and roll as well as yaw
        #[arg(long, default_value_t = false)]
        full_rotation: bool,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Render captures with Celestia and template match them
    Render {
        /// Observed sky image
        #[arg(long)]
        observed: PathBuf,

        /// Renderer executable
        #[arg(long, default_value = "celestia")]
        executable: PathBuf,

        /// Directory receiving one subdirectory of captures per round
        #[arg(long, default_value = "celestia_starfields")]
        output_dir: PathBuf,

        /// Capture file name prefix
        #[arg(long, default_value = "starfield")]
        prefix: String,

        /// Point-to distance passed to the renderer
        #[arg(long, default_value_t = 10000.0)]
        distance: f64,

        /// Seconds to wait after each capture
        #[arg(long, default_value_t = 0.5)]
        capture_wait: f64,

        /// Renderer timeout in seconds (0 waits forever)
        #[arg(long, default_value_t = 600)]
        timeout: u64,

        /// Starting longitude in degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        center_lon: f64,

        /// Starting latitude in degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        center_lat: f64,

        #[command(flatten)]
        search: SearchArgs,
    },
}

fn print_rounds<C: std::fmt::Display, I>(outcome: &SearchOutcome<C, I>) {
    for result in outcome.rounds() {
        println!(
            "Round {} ({}): best {} score {:.6} ({} of {} candidates scored)",
            result.round,
            result.stage,
            result.best,
            result.score,
            result.attempted - result.skipped,
            result.attempted
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Simulate {
            catalog,
            observed,
            save_cache,
            max_stars,
            ra_column,
            dec_column,
            distance_column,
            threshold,
            grid_size,
            scale,
            center_x,
            center_y,
            center_z,
            center_pitch,
            center_roll,
            center_yaw,
            first_axis,
            second_axis,
            full_rotation,
            search,
        } => {
            let catalog_config = CatalogConfig {
                max_stars,
                columns: GaiaColumns {
                    ra: ra_column,
                    dec: dec_column,
                    distance: distance_column,
                },
            };
            let stars = StarCatalog::open(&catalog, &catalog_config)
                .with_context(|| format!("loading catalog {}", catalog.display()))?;
            if let Some(cache) = save_cache {
                stars
                    .save_to_file(&cache)
                    .with_context(|| format!("writing catalog cache {}", cache.display()))?;
                info!("Saved catalog cache to {}", cache.display());
            }

            let raster = RasterConfig {
                size: grid_size,
                scale,
                ..Default::default()
            };
            let observed_pattern =
                load_observed_pattern(&observed, &ObservedImageConfig { threshold }, &raster)
                    .with_context(|| format!("loading observed image {}", observed.display()))?;

            let rotation = if full_rotation {
                RotationModel::Full
            } else {
                RotationModel::YawOnly
            };
            let projector = PoseProjector::new(rotation);
            let provider = ProjectionProvider::new(Arc::new(stars), projector, raster);
            let scorer = StructuralSimilarity::new(SsimConfig::default());
            let mut controller = SearchController::new(provider, scorer, search.to_config());

            let grid = PoseGrid::new(first_axis.into(), second_axis.into())?;
            let center = ObserverPose::new(
                Vector3::new(center_x, center_y, center_z),
                Orientation::new(center_pitch, center_roll, center_yaw),
            );
            let outcome = controller.search(&grid, center, &observed_pattern)?;
            print_rounds(&outcome);

            let best = outcome.final_match();
            let look = projector.look_vector(&best.best.orientation);
            println!(
                "Look vector: [{:.6}, {:.6}, {:.6}]",
                look.x, look.y, look.z
            );
        }

        Command::Render {
            observed,
            executable,
            output_dir,
            prefix,
            distance,
            capture_wait,
            timeout,
            center_lon,
            center_lat,
            search,
        } => {
            let observed_raster = load_observed_raster(&observed)
                .with_context(|| format!("loading observed image {}", observed.display()))?;

            let renderer = CelestiaRenderer::new(RendererConfig {
                executable,
                output_dir,
                file_prefix: prefix,
                distance,
                capture_wait_s: capture_wait,
                timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
                ..Default::default()
            });
            let provider = RenderedProvider::new(renderer);
            let mut controller =
                SearchController::new(provider, SumOfSquaredDifferences, search.to_config());

            let center = SkyCoordinate::new(center_lon, center_lat);
            let outcome = controller.search(&SkyGrid, center, &observed_raster)?;
            print_rounds(&outcome);
        }
    }

    Ok(())
}
