//! Raw image messages as delivered by the host transport.
//!
//! A message carries an encoding string, a byte order flag, a row stride
//! (`step`, which may include padding) and the packed payload. Decoding
//! turns it into a typed [`PixelBuffer`]; encoding writes a cropped
//! buffer back out tightly packed and little-endian.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use nzcrop_core::{CropError, CroppedImage, Depth, PixelBuffer, PixelFormat, Samples};
use serde::{Deserialize, Serialize};

/// Capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Time {
    /// Whole seconds.
    pub sec: i32,
    /// Nanoseconds within the second.
    pub nanosec: u32,
}

/// Metadata passed through the cropper untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    /// Capture time of the frame.
    pub stamp: Time,
    /// Coordinate frame the image was captured in.
    pub frame_id: String,
}

/// An image message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMessage {
    /// Frame metadata.
    pub header: Header,
    /// Rows.
    pub height: u32,
    /// Columns.
    pub width: u32,
    /// Pixel encoding (`mono16`, `32FC1`, ...).
    pub encoding: String,
    /// Byte order of multi-byte samples in `data`.
    pub is_bigendian: bool,
    /// Bytes per row, including any padding.
    pub step: u32,
    /// Packed pixel payload, `step * height` bytes.
    pub data: Vec<u8>,
}

/// Errors that can occur while converting between messages and buffers.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The encoding string names no known pixel format.
    #[error("unsupported encoding: {0}")]
    Encoding(#[source] CropError),

    /// The decoded samples do not fit the declared dimensions.
    #[error("invalid image payload: {0}")]
    Buffer(#[source] CropError),

    /// `step` cannot hold one row of pixels.
    #[error("row step of {step} bytes is smaller than the {required} bytes one row needs")]
    StepTooSmall {
        /// Declared step.
        step: u32,
        /// Bytes one unpadded row needs.
        required: usize,
    },

    /// The payload is shorter than `step * height`.
    #[error("payload holds {actual} bytes, expected at least {expected}")]
    TruncatedData {
        /// Bytes required.
        expected: usize,
        /// Bytes present.
        actual: usize,
    },

    /// A row is too long to describe with a 32-bit step.
    #[error("row of {bytes} bytes does not fit in a 32-bit step")]
    RowTooLong {
        /// Bytes in one row.
        bytes: usize,
    },
}

impl ImageMessage {
    /// Pixel format named by [`encoding`](Self::encoding).
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Encoding`] for unknown encodings.
    pub fn format(&self) -> Result<PixelFormat, MessageError> {
        PixelFormat::from_encoding(&self.encoding).map_err(MessageError::Encoding)
    }

    /// Decode the payload into a typed buffer, honoring the byte order and
    /// skipping row padding.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Encoding`] for unknown encodings,
    /// [`MessageError::StepTooSmall`] if `step` is shorter than a row, and
    /// [`MessageError::TruncatedData`] if the payload is short.
    pub fn to_buffer(&self) -> Result<PixelBuffer, MessageError> {
        let format = self.format()?;
        let row_bytes = self.width as usize * format.bytes_per_pixel();
        let step = self.step as usize;
        if step < row_bytes {
            return Err(MessageError::StepTooSmall {
                step: self.step,
                required: row_bytes,
            });
        }
        let expected = step.saturating_mul(self.height as usize);
        if self.data.len() < expected {
            return Err(MessageError::TruncatedData {
                expected,
                actual: self.data.len(),
            });
        }

        let rows: Vec<&[u8]> = if row_bytes == 0 {
            Vec::new()
        } else {
            self.data
                .chunks(step)
                .take(self.height as usize)
                .map(|row| &row[..row_bytes])
                .collect()
        };
        let samples = if self.is_bigendian {
            decode_samples::<BigEndian>(format.depth, &rows)
        } else {
            decode_samples::<LittleEndian>(format.depth, &rows)
        };
        PixelBuffer::new(self.width, self.height, format.channels, samples)
            .map_err(MessageError::Buffer)
    }

    /// Build the output message for a cropped frame.
    ///
    /// The payload is little-endian with no row padding; `encoding` is
    /// normally the input message's encoding so the format tag is kept.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::RowTooLong`] if a row exceeds `u32::MAX`
    /// bytes.
    pub fn from_cropped(
        cropped: CroppedImage<Header>,
        encoding: String,
    ) -> Result<Self, MessageError> {
        let image = cropped.image;
        let row_bytes = image.width() as usize * image.format().bytes_per_pixel();
        let step = u32::try_from(row_bytes).map_err(|_| MessageError::RowTooLong {
            bytes: row_bytes,
        })?;
        Ok(Self {
            header: cropped.header,
            height: image.height(),
            width: image.width(),
            encoding,
            is_bigendian: false,
            step,
            data: encode_samples::<LittleEndian>(image.samples()),
        })
    }
}

fn decode_samples<B: ByteOrder>(depth: Depth, rows: &[&[u8]]) -> Samples {
    match depth {
        Depth::U8 => Samples::U8(rows.concat()),
        Depth::I8 => Samples::I8(read_all(rows, 1, |b| i8::from_ne_bytes([b[0]]))),
        Depth::U16 => Samples::U16(read_all(rows, 2, B::read_u16)),
        Depth::I16 => Samples::I16(read_all(rows, 2, B::read_i16)),
        Depth::I32 => Samples::I32(read_all(rows, 4, B::read_i32)),
        Depth::F32 => Samples::F32(read_all(rows, 4, B::read_f32)),
        Depth::F64 => Samples::F64(read_all(rows, 8, B::read_f64)),
    }
}

fn read_all<T>(rows: &[&[u8]], size: usize, read: impl Fn(&[u8]) -> T) -> Vec<T> {
    rows.iter()
        .flat_map(|row| row.chunks_exact(size).map(&read))
        .collect()
}

fn encode_samples<B: ByteOrder>(samples: &Samples) -> Vec<u8> {
    match samples {
        Samples::U8(v) => v.clone(),
        Samples::I8(v) => v.iter().map(|s| s.to_ne_bytes()[0]).collect(),
        Samples::U16(v) => write_all(v, 2, B::write_u16),
        Samples::I16(v) => write_all(v, 2, B::write_i16),
        Samples::I32(v) => write_all(v, 4, B::write_i32),
        Samples::F32(v) => write_all(v, 4, B::write_f32),
        Samples::F64(v) => write_all(v, 8, B::write_f64),
    }
}

fn write_all<T: Copy>(samples: &[T], size: usize, write: impl Fn(&mut [u8], T)) -> Vec<u8> {
    let mut out = vec![0; samples.len() * size];
    for (chunk, &sample) in out.chunks_exact_mut(size).zip(samples) {
        write(chunk, sample);
    }
    out
}
