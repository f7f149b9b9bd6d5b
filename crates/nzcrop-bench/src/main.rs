//! nzcrop-bench: run the non-zero cropper on an image file and print
//! per-stage diagnostics.
//!
//! Useful for checking which region a depth or mask image crops to,
//! comparing degenerate-range policies, and timing the stages.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin nzcrop-bench -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Set `RUST_LOG=debug` for more detail on stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use image::{DynamicImage, ImageBuffer, Luma};
use log::{debug, error, info, warn};
use nzcrop_core::diagnostics::{Clock, CropDiagnostics};
use nzcrop_core::{CropConfig, DegenerateRangePolicy, NonZeroCropper, PixelBuffer, Samples};

/// Crop an image to its largest non-zero region and report diagnostics.
#[derive(Parser)]
#[command(name = "nzcrop-bench", version)]
struct Cli {
    /// Path to the input image (8/16-bit grayscale PNG or TIFF; color
    /// images are loaded but rejected by the cropper).
    image_path: PathBuf,

    /// Write the cropped image to this path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// What to do when every non-zero sample has the same value.
    #[arg(long, value_enum, default_value_t = Degenerate::Binarize)]
    degenerate_range: Degenerate,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full crop config as a JSON string.
    ///
    /// When provided, `--degenerate-range` is ignored. The JSON must be a
    /// valid `CropConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Degenerate {
    /// Treat every non-zero sample as foreground.
    Binarize,
    /// Fail the crop.
    Reject,
}

fn config_from_cli(cli: &Cli) -> Result<CropConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(CropConfig {
        degenerate_range: match cli.degenerate_range {
            Degenerate::Binarize => DegenerateRangePolicy::Binarize,
            Degenerate::Reject => DegenerateRangePolicy::Reject,
        },
        ..CropConfig::default()
    })
}

/// Map a decoded image onto a [`PixelBuffer`], keeping its sample depth
/// and channel count.
fn buffer_from_image(image: DynamicImage) -> Result<PixelBuffer, String> {
    let (width, height) = (image.width(), image.height());
    let (channels, samples) = match image {
        DynamicImage::ImageLuma8(gray) => return Ok(PixelBuffer::from_gray(gray)),
        DynamicImage::ImageLuma16(gray) => (1, Samples::U16(gray.into_raw())),
        DynamicImage::ImageLumaA8(img) => (2, Samples::U8(img.into_raw())),
        DynamicImage::ImageLumaA16(img) => (2, Samples::U16(img.into_raw())),
        DynamicImage::ImageRgb8(img) => (3, Samples::U8(img.into_raw())),
        DynamicImage::ImageRgb16(img) => (3, Samples::U16(img.into_raw())),
        DynamicImage::ImageRgb32F(img) => (3, Samples::F32(img.into_raw())),
        DynamicImage::ImageRgba8(img) => (4, Samples::U8(img.into_raw())),
        DynamicImage::ImageRgba16(img) => (4, Samples::U16(img.into_raw())),
        DynamicImage::ImageRgba32F(img) => (4, Samples::F32(img.into_raw())),
        other => return Err(format!("Unsupported pixel layout {:?}", other.color())),
    };
    PixelBuffer::new(width, height, channels, samples).map_err(|e| e.to_string())
}

/// Save a single-channel 8- or 16-bit crop.
fn write_crop(path: &Path, crop: &PixelBuffer) -> Result<(), String> {
    let (width, height) = (crop.width(), crop.height());
    let result = match crop.samples() {
        Samples::U8(data) if crop.channels() == 1 => {
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data.clone()).map(|img| img.save(path))
        }
        Samples::U16(data) if crop.channels() == 1 => {
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, data.clone()).map(|img| img.save(path))
        }
        _ => {
            return Err(format!(
                "Cannot write {} crops, only mono8 and mono16",
                crop.format()
            ));
        }
    };
    match result {
        Some(saved) => saved.map_err(|e| format!("Error writing {}: {e}", path.display())),
        None => Err(format!("Crop buffer does not match {width}x{height}")),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            error!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image = match image::open(&cli.image_path) {
        Ok(img) => img,
        Err(e) => {
            error!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };
    let buffer = match buffer_from_image(image) {
        Ok(b) => b,
        Err(msg) => {
            error!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Image: {} ({}x{}, {})",
        cli.image_path.display(),
        buffer.width(),
        buffer.height(),
        buffer.format(),
    );
    debug!("Config: {config:?}");
    info!("Runs: {}", cli.runs);

    let cropper = NonZeroCropper::new(config);
    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match cropper.crop_with_diagnostics(buffer.clone(), (), &StdClock) {
            Ok((cropped, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            error!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write the crop on the first run only.
                if run == 0
                    && let Some(ref path) = cli.output
                {
                    match write_crop(path, &cropped.image) {
                        Ok(()) => info!(
                            "Crop written to {} ({}x{})",
                            path.display(),
                            cropped.image.width(),
                            cropped.image.height(),
                        ),
                        Err(msg) => warn!("{msg}"),
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                error!("Crop error: {e}");
                return ExitCode::FAILURE;
            }
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

type StageExtractor = fn(&CropDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[CropDiagnostics]) {
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

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Normalize", |d| d.normalize.duration),
        ("Contour Tracing", |d| d.contour_tracing.duration),
        ("Selection", |d| d.selection.duration),
        ("Extraction", |d| d.extraction.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
