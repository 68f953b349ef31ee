//! kaku-bench: CLI tool for detector parameter experimentation and diagnostics.
//!
//! Runs corner detection on a given image file with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Comparing scoring strategies (Harris vs Shi-Tomashi vs FAST)
//! - Tuning thresholds, window size and suppression distance
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin kaku-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use kaku_pipeline::diagnostics::{Clock, DetectionDiagnostics, detect_with_diagnostics};
use kaku_pipeline::{DetectorConfig, ScoringStrategy, grayscale};

/// Detector parameter experimentation and diagnostics for kaku.
///
/// Runs corner detection on a given image with configurable parameters
/// and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "kaku-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Corner scoring strategy.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_STRATEGY)]
    strategy: Strategy,

    /// Fraction of each axis covered by the detection region.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_REGION_FRACTION)]
    region_fraction: f64,

    /// Structure tensor window size.
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

    /// Minimum distance between kept corners.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_MIN_DISTANCE)]
    min_distance: f64,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full detector config as a JSON string.
    ///
    /// When provided, all other detector parameter flags are ignored.
    /// The JSON must be a valid `DetectorConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Scoring strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Harris response over a top-left window.
    Harris,
    /// Minimum eigenvalue over a centred window.
    ShiTomashi,
    /// 8-point ring test.
    Fast,
}

/// Maps a [`ScoringStrategy`] to the local CLI [`Strategy`] enum.
const fn strategy_from_pipeline(s: ScoringStrategy) -> Strategy {
    match s {
        ScoringStrategy::Harris => Strategy::Harris,
        ScoringStrategy::ShiTomashi => Strategy::ShiTomashi,
        ScoringStrategy::Fast => Strategy::Fast,
    }
}

/// The CLI default strategy, derived from
/// [`DetectorConfig::DEFAULT_STRATEGY`] so the two cannot silently diverge.
const CLI_DEFAULT_STRATEGY: Strategy = strategy_from_pipeline(DetectorConfig::DEFAULT_STRATEGY);

/// Build a [`DetectorConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<DetectorConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(DetectorConfig {
        strategy: match cli.strategy {
            Strategy::Harris => ScoringStrategy::Harris,
            Strategy::ShiTomashi => ScoringStrategy::ShiTomashi,
            Strategy::Fast => ScoringStrategy::Fast,
        },
        region_fraction: cli.region_fraction,
        window: cli.window,
        score_threshold: cli.score_threshold,
        harris_k: cli.harris_k,
        fast_threshold: cli.fast_threshold,
        min_distance: cli.min_distance,
        ..DetectorConfig::default()
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match grayscale::decode(&image_bytes) {
        Ok(decoded) => grayscale::to_rgba(&decoded),
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.image_path.display(),
        image_bytes.len(),
        image.width(),
        image.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match detect_with_diagnostics(&image, &config, &StdClock) {
            Ok((_, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }
                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Detection error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Min, mean and max of a non-empty sample, in the sample's units.
#[allow(clippy::cast_precision_loss)]
fn min_mean_max(samples: &[f64]) -> (f64, f64, f64) {
    let min = samples.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = samples.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    };
    (min, mean, max)
}

/// Print aggregated statistics across multiple runs.
fn print_multi_run_summary(all_diagnostics: &[DetectionDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let totals: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();
    let (min, mean, max) = min_mean_max(&totals);
    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<16} {:>12} {:>12}", "Stage", "Mean (ms)", "Max (ms)");
    println!("{}", "-".repeat(42));

    let stage_count = all_diagnostics[0].stages().len();
    for index in 0..stage_count {
        let name = all_diagnostics[0].stages()[index].0;
        let durations: Vec<f64> = all_diagnostics
            .iter()
            .map(|d| d.stages()[index].1.duration.as_secs_f64() * 1000.0)
            .collect();
        let (_, stage_mean, stage_max) = min_mean_max(&durations);
        println!("{name:<16} {stage_mean:>10.3}ms {stage_max:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_library() {
        let cli = Cli::try_parse_from(["kaku-bench", "in.png"]).unwrap();
        assert_eq!(config_from_cli(&cli).unwrap(), DetectorConfig::default());
    }

    #[test]
    fn config_json_wins_over_flags() {
        let cli = Cli::try_parse_from([
            "kaku-bench",
            "in.png",
            "--strategy",
            "harris",
            "--config-json",
            r#"{"strategy":"fast","fast_threshold":60}"#,
        ])
        .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.strategy, ScoringStrategy::Fast);
        assert_eq!(config.fast_threshold, 60);
    }

    #[test]
    fn zero_runs_is_rejected() {
        assert!(Cli::try_parse_from(["kaku-bench", "in.png", "--runs", "0"]).is_err());
    }

    #[test]
    fn min_mean_max_of_samples() {
        let (min, mean, max) = min_mean_max(&[2.0, 4.0, 9.0]);
        assert!((min - 2.0).abs() < f64::EPSILON);
        assert!((mean - 5.0).abs() < f64::EPSILON);
        assert!((max - 9.0).abs() < f64::EPSILON);
    }
}
