//! Pixel formats: sample depth plus channel count.
//!
//! Formats are usually named by an encoding string. Two families are
//! understood:
//!
//! - named encodings such as `mono8`, `mono16`, `rgb8`, `bgra16`,
//!   `yuv422` and the `bayer_*` variants;
//! - generic `<bits><U|S|F>C<n>` encodings such as `8UC1`, `16UC1`,
//!   `32FC1` or `64FC3`. An omitted channel count means one channel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CropError;

/// Numeric encoding of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Depth {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl Depth {
    /// Size of one sample in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Tag used in generic encodings (`8U`, `16S`, `32F`, ...).
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::U8 => "8U",
            Self::I8 => "8S",
            Self::U16 => "16U",
            Self::I16 => "16S",
            Self::I32 => "32S",
            Self::F32 => "32F",
            Self::F64 => "64F",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "8U" => Self::U8,
            "8S" => Self::I8,
            "16U" => Self::U16,
            "16S" => Self::I16,
            "32S" => Self::I32,
            "32F" => Self::F32,
            "64F" => Self::F64,
            _ => return None,
        })
    }
}

/// Sample depth and channel count of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelFormat {
    /// Numeric encoding of each sample.
    pub depth: Depth,
    /// Interleaved samples per pixel.
    pub channels: u8,
}

impl PixelFormat {
    /// Unsigned 8-bit, one channel.
    pub const MONO8: Self = Self::new(Depth::U8, 1);
    /// Unsigned 16-bit, one channel (typical depth image in millimetres).
    pub const MONO16: Self = Self::new(Depth::U16, 1);
    /// 32-bit float, one channel (typical depth image in metres).
    pub const FLOAT32: Self = Self::new(Depth::F32, 1);
    /// 64-bit float, one channel.
    pub const FLOAT64: Self = Self::new(Depth::F64, 1);

    /// Create a new format.
    #[must_use]
    pub const fn new(depth: Depth, channels: u8) -> Self {
        Self { depth, channels }
    }

    /// Returns `true` for exactly one channel.
    #[must_use]
    pub const fn is_single_channel(self) -> bool {
        self.channels == 1
    }

    /// Returns `true` for unsigned 8-bit single-channel data, which can be
    /// used as a contour mask without normalization.
    #[must_use]
    pub const fn is_mono8(self) -> bool {
        matches!(self.depth, Depth::U8) && self.is_single_channel()
    }

    /// Bytes per pixel across all channels.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        self.depth.bytes() * self.channels as usize
    }

    /// Parse an encoding string.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::UnknownEncoding`] if the string is neither a
    /// known named encoding nor a valid generic one.
    pub fn from_encoding(encoding: &str) -> Result<Self, CropError> {
        let format = match encoding {
            "mono8" | "bayer_rggb8" | "bayer_bggr8" | "bayer_gbrg8" | "bayer_grbg8" => Self::MONO8,
            "mono16" | "bayer_rggb16" | "bayer_bggr16" | "bayer_gbrg16" | "bayer_grbg16" => {
                Self::MONO16
            }
            "yuv422" | "uyvy" | "yuyv" | "yuv422_yuy2" => Self::new(Depth::U8, 2),
            "rgb8" | "bgr8" => Self::new(Depth::U8, 3),
            "rgba8" | "bgra8" => Self::new(Depth::U8, 4),
            "rgb16" | "bgr16" => Self::new(Depth::U16, 3),
            "rgba16" | "bgra16" => Self::new(Depth::U16, 4),
            other => {
                return Self::parse_generic(other)
                    .ok_or_else(|| CropError::UnknownEncoding(other.to_owned()));
            }
        };
        Ok(format)
    }

    /// Generic encoding string (`8UC1`, `32FC1`, ...).
    #[must_use]
    pub fn encoding(self) -> String {
        format!("{}C{}", self.depth.tag(), self.channels)
    }

    fn parse_generic(encoding: &str) -> Option<Self> {
        let (tag, channels) = encoding.split_once('C')?;
        let depth = Depth::from_tag(tag)?;
        let channels = if channels.is_empty() {
            1
        } else {
            channels.parse::<u8>().ok().filter(|&n| n > 0)?
        };
        Some(Self::new(depth, channels))
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoding())
    }
}
