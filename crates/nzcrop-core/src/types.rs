//! Shared types for the non-zero cropping pipeline.

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::contour::ContourTracerKind;

/// Re-export `GrayImage` so downstream crates can reference the
/// intermediate mask without depending on `image` directly.
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// An integer pixel position on the image grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Column (pixels from left edge).
    pub x: u32,
    /// Row (pixels from top edge).
    pub y: u32,
}

impl PixelPoint {
    /// Create a new pixel point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in source-image pixel coordinates.
///
/// Extents are inclusive of the boundary pixels: a rectangle around a
/// single pixel has `width == height == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingRect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingRect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering a whole image.
    #[must_use]
    pub const fn full(dimensions: Dimensions) -> Self {
        Self::new(0, 0, dimensions.width, dimensions.height)
    }

    /// Minimal rectangle enclosing all `points`, or `None` if there are none.
    #[must_use]
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = PixelPoint>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min_x, min_y, max_x, max_y) = points.fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        );
        Some(Self::new(
            min_x,
            min_y,
            max_x - min_x + 1,
            max_y - min_y + 1,
        ))
    }

    /// Size of the rectangle.
    #[must_use]
    pub const fn dimensions(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Number of pixels covered.
    #[must_use]
    pub const fn area(self) -> u64 {
        self.dimensions().pixel_count()
    }

    /// Returns `true` if the rectangle is non-empty and lies entirely
    /// inside an image of the given dimensions.
    #[must_use]
    pub fn fits_within(self, dimensions: Dimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self
                .x
                .checked_add(self.width)
                .is_some_and(|right| right <= dimensions.width)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= dimensions.height)
    }
}

/// What to do when every non-zero sample has the same value, so the
/// normalization range collapses to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateRangePolicy {
    /// Treat the image as a presence map: non-zero samples become 255,
    /// zero samples stay 0.
    #[default]
    Binarize,
    /// Fail with [`CropError::DegenerateNormalizationRange`].
    Reject,
}

/// Configuration for [`NonZeroCropper`](crate::NonZeroCropper).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Behavior when the non-zero value range is degenerate. Only
    /// consulted for non-8-bit input.
    pub degenerate_range: DegenerateRangePolicy,

    /// Which contour tracing algorithm to use.
    pub contour_tracer: ContourTracerKind,
}

/// A cropped image together with the rectangle it was cut from.
///
/// `header` is the caller's metadata, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedImage<H> {
    /// Pixels inside [`rect`](Self::rect), in the source depth.
    pub image: PixelBuffer,
    /// The region of the source image that was kept.
    pub rect: BoundingRect,
    /// Caller-supplied metadata (timestamp, frame id, ...).
    pub header: H,
}

/// Errors that can occur while cropping.
///
/// None of these are fatal: a host is expected to drop the frame and
/// carry on with the next one.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum CropError {
    /// The image has more than one channel.
    #[error("only single-channel images are accepted, got {channels} channels")]
    UnsupportedChannelCount {
        /// Channel count of the rejected image.
        channels: u8,
    },

    /// Every non-zero sample has the same value and the configured
    /// [`DegenerateRangePolicy`] is [`Reject`](DegenerateRangePolicy::Reject).
    #[error("degenerate normalization range [{min}, {max}]")]
    DegenerateNormalizationRange {
        /// Smallest non-zero sample.
        min: f64,
        /// Largest non-zero sample.
        max: f64,
    },

    /// The mask contains no non-zero region.
    #[error("no non-zero region found in the image")]
    NoContourFound,

    /// Sample storage does not match the declared dimensions.
    #[error("buffer holds {actual} samples, expected {expected}")]
    BufferSizeMismatch {
        /// Samples required by `width * height * channels`.
        expected: usize,
        /// Samples actually supplied.
        actual: usize,
    },

    /// A requested region does not lie inside the image.
    #[error("region {rect:?} does not fit in a {}x{} image", dimensions.width, dimensions.height)]
    RegionOutOfBounds {
        /// The requested region.
        rect: BoundingRect,
        /// Size of the image it was requested from.
        dimensions: Dimensions,
    },

    /// The pixel encoding string is not recognized.
    #[error("unknown pixel encoding: {0}")]
    UnknownEncoding(String),
}
