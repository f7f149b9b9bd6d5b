//! Typed pixel storage.
//!
//! A [`PixelBuffer`] owns row-major, channel-interleaved samples of one
//! [`Depth`]. The storage variant *is* the depth, so the declared format
//! can never disagree with the data.

use image::GrayImage;

use crate::format::{Depth, PixelFormat};
use crate::types::{BoundingRect, CropError, Dimensions};

/// Sample storage, one variant per [`Depth`].
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Unsigned 8-bit samples.
    U8(Vec<u8>),
    /// Signed 8-bit samples.
    I8(Vec<i8>),
    /// Unsigned 16-bit samples.
    U16(Vec<u16>),
    /// Signed 16-bit samples.
    I16(Vec<i16>),
    /// Signed 32-bit samples.
    I32(Vec<i32>),
    /// 32-bit float samples.
    F32(Vec<f32>),
    /// 64-bit float samples.
    F64(Vec<f64>),
}

impl Samples {
    /// Depth of the stored samples.
    #[must_use]
    pub const fn depth(&self) -> Depth {
        match self {
            Self::U8(_) => Depth::U8,
            Self::I8(_) => Depth::I8,
            Self::U16(_) => Depth::U16,
            Self::I16(_) => Depth::I16,
            Self::I32(_) => Depth::I32,
            Self::F32(_) => Depth::F32,
            Self::F64(_) => Depth::F64,
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    /// Returns `true` if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A 2D image of interleaved samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    dimensions: Dimensions,
    channels: u8,
    samples: Samples,
}

impl PixelBuffer {
    /// Create a buffer, checking that `samples` holds exactly
    /// `width * height * channels` values.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::BufferSizeMismatch`] if the sample count is
    /// wrong (a channel count of zero can never match a non-empty image).
    pub fn new(width: u32, height: u32, channels: u8, samples: Samples) -> Result<Self, CropError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(usize::from(channels)))
            .unwrap_or(usize::MAX);
        let actual = samples.len();
        if expected != actual || (channels == 0 && width > 0 && height > 0) {
            return Err(CropError::BufferSizeMismatch { expected, actual });
        }
        Ok(Self {
            dimensions: Dimensions::new(width, height),
            channels,
            samples,
        })
    }

    /// Single-channel unsigned 8-bit buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::BufferSizeMismatch`] if `data.len() != width * height`.
    pub fn mono8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CropError> {
        Self::new(width, height, 1, Samples::U8(data))
    }

    /// Single-channel unsigned 16-bit buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::BufferSizeMismatch`] if `data.len() != width * height`.
    pub fn mono16(width: u32, height: u32, data: Vec<u16>) -> Result<Self, CropError> {
        Self::new(width, height, 1, Samples::U16(data))
    }

    /// Single-channel 32-bit float buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::BufferSizeMismatch`] if `data.len() != width * height`.
    pub fn float32(width: u32, height: u32, data: Vec<f32>) -> Result<Self, CropError> {
        Self::new(width, height, 1, Samples::F32(data))
    }

    /// Wrap an 8-bit grayscale image without copying its pixels.
    #[must_use]
    pub fn from_gray(image: GrayImage) -> Self {
        let dimensions = Dimensions::new(image.width(), image.height());
        Self::from_parts(dimensions, 1, Samples::U8(image.into_raw()))
    }

    /// Assemble a buffer whose sample count is already known to match.
    pub(crate) const fn from_parts(dimensions: Dimensions, channels: u8, samples: Samples) -> Self {
        Self {
            dimensions,
            channels,
            samples,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.dimensions.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// Width and height.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Interleaved samples per pixel.
    #[must_use]
    pub const fn channels(&self) -> u8 {
        self.channels
    }

    /// Depth and channel count.
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        PixelFormat::new(self.samples.depth(), self.channels)
    }

    /// The stored samples.
    #[must_use]
    pub const fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Consume the buffer and return its samples.
    #[must_use]
    pub fn into_samples(self) -> Samples {
        self.samples
    }

    /// Copy the pixels inside `rect` into a new buffer of the same format.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::RegionOutOfBounds`] if `rect` is empty or does
    /// not lie inside the image.
    pub fn extract(&self, rect: BoundingRect) -> Result<Self, CropError> {
        if !rect.fits_within(self.dimensions) {
            return Err(CropError::RegionOutOfBounds {
                rect,
                dimensions: self.dimensions,
            });
        }
        let layout = RowLayout {
            row_len: self.width() as usize * usize::from(self.channels),
            start: rect.x as usize * usize::from(self.channels),
            len: rect.width as usize * usize::from(self.channels),
            first_row: rect.y as usize,
            rows: rect.height as usize,
        };
        let samples = match &self.samples {
            Samples::U8(v) => Samples::U8(layout.copy(v)),
            Samples::I8(v) => Samples::I8(layout.copy(v)),
            Samples::U16(v) => Samples::U16(layout.copy(v)),
            Samples::I16(v) => Samples::I16(layout.copy(v)),
            Samples::I32(v) => Samples::I32(layout.copy(v)),
            Samples::F32(v) => Samples::F32(layout.copy(v)),
            Samples::F64(v) => Samples::F64(layout.copy(v)),
        };
        Ok(Self::from_parts(rect.dimensions(), self.channels, samples))
    }
}

/// Sample ranges of a rectangular region, measured in samples.
struct RowLayout {
    row_len: usize,
    start: usize,
    len: usize,
    first_row: usize,
    rows: usize,
}

impl RowLayout {
    fn copy<T: Copy>(&self, data: &[T]) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len * self.rows);
        for row in data
            .chunks_exact(self.row_len)
            .skip(self.first_row)
            .take(self.rows)
        {
            out.extend_from_slice(&row[self.start..self.start + self.len]);
        }
        out
    }
}
