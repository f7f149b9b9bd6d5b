//! Contour extraction and selection on an 8-bit mask.
//!
//! [`ContourTracer`] is the seam for pluggable tracing algorithms and
//! [`ContourTracerKind`] selects one at runtime. The shipped tracer keeps
//! only *external* borders (outermost boundaries of connected non-zero
//! regions, holes are not reported) and returns every boundary pixel, with
//! no polygon approximation.

use image::GrayImage;
use imageproc::contours::BorderType;
use serde::{Deserialize, Serialize};

use crate::types::{BoundingRect, PixelPoint};

/// An ordered, closed boundary of a connected non-zero region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour(Vec<PixelPoint>);

impl Contour {
    /// Create a contour from its boundary points.
    #[must_use]
    pub const fn new(points: Vec<PixelPoint>) -> Self {
        Self(points)
    }

    /// Number of boundary points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The boundary points in tracing order.
    #[must_use]
    pub fn points(&self) -> &[PixelPoint] {
        &self.0
    }

    /// Minimal axis-aligned rectangle enclosing the boundary.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<BoundingRect> {
        BoundingRect::enclosing(self.0.iter().copied())
    }
}

/// Selects which contour tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourTracerKind {
    /// Suzuki-Abe border following via `imageproc::contours::find_contours`,
    /// keeping top-level outer borders only.
    #[default]
    ExternalBorderFollowing,
}

/// Trait for contour tracing strategies.
///
/// Input: an 8-bit mask where every non-zero pixel is foreground.
/// Output: contours in discovery order.
pub trait ContourTracer {
    /// Trace contours in the given mask.
    fn trace(&self, mask: &GrayImage) -> Vec<Contour>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, mask: &GrayImage) -> Vec<Contour> {
        match *self {
            Self::ExternalBorderFollowing => trace_external(mask),
        }
    }
}

impl<T: ContourTracer + ?Sized> ContourTracer for &T {
    fn trace(&self, mask: &GrayImage) -> Vec<Contour> {
        (**self).trace(mask)
    }
}

/// Outer borders without a parent border are the outermost boundaries;
/// borders nested inside a hole have the hole as parent.
///
/// `find_contours` never starts an outer border in column 0, so the mask is
/// traced inside a one-pixel zero frame and points are shifted back.
fn trace_external(mask: &GrayImage) -> Vec<Contour> {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);

    imageproc::contours::find_contours::<u32>(&padded)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            Contour::new(
                c.points
                    .into_iter()
                    .map(|p| PixelPoint::new(p.x.saturating_sub(1), p.y.saturating_sub(1)))
                    .collect(),
            )
        })
        .collect()
}

/// Pick the contour with the most boundary points.
///
/// Point count stands in for region size, so a long thin boundary can win
/// over a compact region that encloses more pixels. On ties the earliest
/// contour is kept: a later contour replaces the current best only with a
/// strictly greater count.
#[must_use]
pub fn select_largest(contours: &[Contour]) -> Option<&Contour> {
    largest_index(contours).map(|i| &contours[i])
}

/// Discovery index of the contour [`select_largest`] picks.
#[must_use]
pub fn largest_index(contours: &[Contour]) -> Option<usize> {
    (0..contours.len()).reduce(|best, i| {
        if contours[i].len() > contours[best].len() {
            i
        } else {
            best
        }
    })
}
