//! Crop diagnostics: timing and counts for each stage.
//!
//! [`NonZeroCropper::crop_with_diagnostics`](crate::NonZeroCropper::crop_with_diagnostics)
//! collects these alongside the cropped image. They exist for tuning and
//! for hosts that want to report why a frame was cropped the way it was.
//!
//! Time is read through the [`Clock`] trait so callers pick the time
//! source. [`SystemClock`] uses the `web-time` crate, which maps to
//! `performance.now()` on WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contour::Contour;
use crate::format::PixelFormat;
use crate::normalize::NormalizationRange;
use crate::types::BoundingRect;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| serde::de::Error::custom("duration must be finite and non-negative"))
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> Self::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropDiagnostics {
    /// Stage 1: mask construction.
    pub normalize: StageDiagnostics,
    /// Stage 2: contour tracing.
    pub contour_tracing: StageDiagnostics,
    /// Stage 3: largest-contour selection and bounding.
    pub selection: StageDiagnostics,
    /// Stage 4: copying the region out of the source image.
    pub extraction: StageDiagnostics,
    /// Total wall-clock duration of the crop (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary across all stages.
    pub summary: CropSummary,
}

/// Diagnostics for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Mask construction metrics.
    Normalize {
        /// Format of the source image.
        source_format: PixelFormat,
        /// `true` when the 8-bit input was used as the mask directly.
        passthrough: bool,
        /// Range the mask was rescaled from (`None` for passthrough).
        range: Option<NormalizationRange>,
        /// Non-zero pixels in the mask.
        mask_nonzero_count: u64,
    },
    /// Contour tracing metrics.
    ContourTracing {
        /// Number of external contours found.
        contour_count: usize,
        /// Points across all contours.
        total_point_count: usize,
        /// Fewest points in any contour.
        min_contour_points: usize,
        /// Most points in any contour.
        max_contour_points: usize,
    },
    /// Selection metrics.
    Selection {
        /// Discovery index of the chosen contour.
        selected_index: usize,
        /// Points in the chosen contour.
        selected_point_count: usize,
        /// Bounding rectangle of the chosen contour.
        rect: BoundingRect,
    },
    /// Extraction metrics.
    Extraction {
        /// Output width in pixels.
        width: u32,
        /// Output height in pixels.
        height: u32,
        /// Fraction of source pixels kept (0.0 to 1.0).
        retained_fraction: f64,
    },
}

/// Counts across the whole crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Source pixel count.
    pub pixel_count: u64,
    /// Number of contours found.
    pub contour_count: usize,
    /// Region kept.
    pub rect: BoundingRect,
}

impl CropDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Crop Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Normalize", &self.normalize),
            ("Contour Tracing", &self.contour_tracing),
            ("Selection", &self.selection),
            ("Extraction", &self.extraction),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        let rect = self.summary.rect;
        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Kept: x={} y={} {}x{}",
            self.summary.contour_count, rect.x, rect.y, rect.width, rect.height,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Normalize {
            source_format,
            passthrough: true,
            mask_nonzero_count,
            ..
        } => format!("{source_format} used as mask, nonzero={mask_nonzero_count}"),
        StageMetrics::Normalize {
            source_format,
            range,
            mask_nonzero_count,
            ..
        } => match range {
            Some(r) => format!(
                "{source_format} range=[{}, {}] nonzero={mask_nonzero_count}",
                r.min, r.max
            ),
            None => format!("{source_format} nonzero={mask_nonzero_count}"),
        },
        StageMetrics::ContourTracing {
            contour_count,
            total_point_count,
            min_contour_points,
            max_contour_points,
        } => format!(
            "{contour_count} contours, {total_point_count} pts (min={min_contour_points} max={max_contour_points})",
        ),
        StageMetrics::Selection {
            selected_index,
            selected_point_count,
            rect,
        } => format!(
            "#{selected_index} ({selected_point_count} pts) -> {}x{} at ({}, {})",
            rect.width, rect.height, rect.x, rect.y,
        ),
        StageMetrics::Extraction {
            width,
            height,
            retained_fraction,
        } => format!(
            "{width}x{height} ({:.1}% kept)",
            retained_fraction * 100.0
        ),
    }
}

/// Count non-zero pixels in a mask.
pub(crate) fn count_mask_pixels(mask: &image::GrayImage) -> u64 {
    mask.as_raw().iter().map(|&v| u64::from(v != 0)).sum()
}

/// Point-count statistics for a set of contours.
pub(crate) fn contour_metrics(contours: &[Contour]) -> StageMetrics {
    StageMetrics::ContourTracing {
        contour_count: contours.len(),
        total_point_count: contours.iter().map(Contour::len).sum(),
        min_contour_points: contours.iter().map(Contour::len).min().unwrap_or(0),
        max_contour_points: contours.iter().map(Contour::len).max().unwrap_or(0),
    }
}

/// Fraction of `total` pixels covered by `rect`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn retained_fraction(rect: BoundingRect, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        rect.area() as f64 / total as f64
    }
}
