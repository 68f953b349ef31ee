//! kaku: detect corners in an image file and write an annotated copy.
//!
//! # Usage
//!
//! ```text
//! kaku [OPTIONS] <IMAGE_PATH>
//! kaku photo.jpg --algorithm shi-tomashi --json corners.json
//! ```
//!
//! The annotated image is always PNG-encoded. Without `--output` it is
//! written to `modified-<algorithm>.png` in the current directory.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use kaku_export::{ExportError, JsonMetadata, SvgMetadata};
use kaku_pipeline::{DetectorConfig, DetectorError, Marker, MarkerStyle, ScoringStrategy};
use tracing::{error, info};

/// Harris, Shi-Tomashi and FAST corner detection.
///
/// Scores corners inside the central region of the image, keeps the
/// strongest ones at least `--min-distance` apart, and burns markers
/// into a copy of the input.
#[derive(Parser)]
#[command(name = "kaku", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Corner scoring algorithm.
    #[arg(short, long, value_enum, default_value_t = CLI_DEFAULT_ALGORITHM)]
    algorithm: Algorithm,

    /// Annotated PNG output path [default: modified-<algorithm>.png].
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the surviving corners as JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write an SVG corner overlay to this path.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Fraction of each axis covered by the centred detection region.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_REGION_FRACTION)]
    region_fraction: f64,

    /// Structure tensor window size (Harris, Shi-Tomashi).
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_WINDOW, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    window: u32,

    /// Harris / Shi-Tomashi candidate threshold.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_SCORE_THRESHOLD, allow_negative_numbers = true)]
    score_threshold: f64,

    /// Harris k constant.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_HARRIS_K)]
    harris_k: f64,

    /// FAST ring intensity threshold.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_FAST_THRESHOLD)]
    fast_threshold: u8,

    /// Minimum distance in pixels between two kept corners.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_MIN_DISTANCE)]
    min_distance: f64,

    /// Draw a small cross instead of a single pixel per corner.
    #[arg(long)]
    cross: bool,

    /// Full detector config as a JSON string.
    ///
    /// When provided, all other detector parameter flags (including
    /// `--algorithm`) are ignored.
    #[arg(long)]
    config_json: Option<String>,
}

/// Scoring algorithm selection.
#[derive(Clone, Copy, ValueEnum)]
enum Algorithm {
    /// `det - k*trace` over a top-left window.
    Harris,
    /// Minimum structure tensor eigenvalue over a centred window.
    ShiTomashi,
    /// 8-point ring intensity test.
    Fast,
}

/// Maps a [`ScoringStrategy`] to the local CLI [`Algorithm`] enum.
const fn algorithm_from_strategy(s: ScoringStrategy) -> Algorithm {
    match s {
        ScoringStrategy::Harris => Algorithm::Harris,
        ScoringStrategy::ShiTomashi => Algorithm::ShiTomashi,
        ScoringStrategy::Fast => Algorithm::Fast,
    }
}

/// The CLI default algorithm, derived from
/// [`DetectorConfig::DEFAULT_STRATEGY`] so the two cannot diverge.
const CLI_DEFAULT_ALGORITHM: Algorithm = algorithm_from_strategy(DetectorConfig::DEFAULT_STRATEGY);

impl From<Algorithm> for ScoringStrategy {
    fn from(a: Algorithm) -> Self {
        match a {
            Algorithm::Harris => Self::Harris,
            Algorithm::ShiTomashi => Self::ShiTomashi,
            Algorithm::Fast => Self::Fast,
        }
    }
}

/// Anything that can end a CLI run early.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to parse --config-json: {0}")]
    ConfigJson(#[source] serde_json::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Detect(#[from] DetectorError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Build a [`DetectorConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly (missing
/// fields take their defaults) and the individual flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<DetectorConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(CliError::ConfigJson);
    }

    Ok(DetectorConfig {
        strategy: cli.algorithm.into(),
        region_fraction: cli.region_fraction,
        window: cli.window,
        score_threshold: cli.score_threshold,
        harris_k: cli.harris_k,
        fast_threshold: cli.fast_threshold,
        min_distance: cli.min_distance,
        marker: Marker {
            style: if cli.cross {
                MarkerStyle::Cross
            } else {
                MarkerStyle::Pixel
            },
            ..Marker::default()
        },
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = contents.len(), "wrote");
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;

    let image_bytes = std::fs::read(&cli.image_path).map_err(|source| CliError::Read {
        path: cli.image_path.clone(),
        source,
    })?;
    info!(
        path = %cli.image_path.display(),
        bytes = image_bytes.len(),
        strategy = %config.strategy,
        "detecting corners"
    );

    let detection = kaku_pipeline::process(&image_bytes, &config)?;
    info!(
        candidates = detection.candidate_count,
        corners = detection.corners.len(),
        "detection finished"
    );

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.strategy.default_output_name()));
    write_file(&output, &kaku_export::to_png(&detection.annotated)?)?;

    let source_name = cli.image_path.file_name().and_then(|s| s.to_str());

    if let Some(ref json_path) = cli.json {
        let metadata = JsonMetadata {
            source: source_name,
            config: Some(&config),
        };
        let json = kaku_export::to_json(&detection, &metadata)?;
        write_file(json_path, json.as_bytes())?;
    }

    if let Some(ref svg_path) = cli.svg {
        let config_json = serde_json::to_string(&config).map_err(ExportError::from)?;
        let description = format!(
            "{} corners ({} candidates)",
            detection.corners.len(),
            detection.candidate_count
        );
        let metadata = SvgMetadata {
            title: source_name,
            description: Some(&description),
            config_json: Some(&config_json),
        };
        let svg = kaku_export::to_svg(&detection.corners, detection.dimensions, &metadata);
        write_file(svg_path, svg.as_bytes())?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
