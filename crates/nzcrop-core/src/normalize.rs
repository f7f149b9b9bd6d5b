//! Normalization of arbitrary sample ranges into an 8-bit contour mask.
//!
//! Unsigned 8-bit input is already a mask and is used as-is. Every other
//! depth is rescaled linearly so that the smallest *non-zero* sample maps
//! to 0 and the largest to 255:
//!
//! ```text
//! alpha = 255 / (max - min)
//! beta  = -min * alpha
//! mask  = saturate_u8(round_half_even(v * alpha + beta))
//! ```
//!
//! `min` and `max` ignore samples that are exactly zero, as well as NaN
//! and infinities, so the range reflects only the observed signal.
//! Values that land outside `[0, 255]` saturate rather than wrap; NaN
//! maps to 0.
//!
//! If `max - min` overflows `f64`, samples and bounds are first divided
//! by the larger bound magnitude; the range is still a real rescale, not a
//! degenerate one.
//!
//! Note that the smallest non-zero sample itself maps to 0 and therefore
//! drops out of the mask, and with negative samples present a zero sample
//! maps above 0.

use std::cmp::Ordering;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::buffer::{PixelBuffer, Samples};
use crate::types::{CropError, DegenerateRangePolicy, Dimensions};

/// Minimum and maximum over the non-zero, finite samples of an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    /// Smallest non-zero sample.
    pub min: f64,
    /// Largest non-zero sample.
    pub max: f64,
}

impl NormalizationRange {
    /// `max - min`. Infinite if the difference overflows `f64`.
    #[must_use]
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    /// Returns `true` if every non-zero sample has the same value, so no
    /// linear rescale exists.
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        self.max.partial_cmp(&self.min) != Some(Ordering::Greater)
    }

    /// Divisor applied to samples and bounds before rescaling, so that the
    /// span stays finite. `1.0` unless `max - min` overflows.
    fn scale(self) -> f64 {
        if self.span().is_finite() {
            1.0
        } else {
            self.min.abs().max(self.max.abs())
        }
    }
}

/// Masked min/max: range of the samples that are neither zero nor
/// non-finite. Returns `None` if there are no such samples.
#[must_use]
pub fn nonzero_range<T: Copy + Into<f64>>(samples: &[T]) -> Option<NormalizationRange> {
    samples
        .iter()
        .copied()
        .map(Into::<f64>::into)
        .filter(|v| *v != 0.0 && v.is_finite())
        .fold(None, |range, v| {
            Some(match range {
                None => NormalizationRange { min: v, max: v },
                Some(NormalizationRange { min, max }) => NormalizationRange {
                    min: min.min(v),
                    max: max.max(v),
                },
            })
        })
}

/// Round half to even and clamp into `u8`, mapping NaN to 0.
#[must_use]
pub fn saturate_u8(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = value.round_ties_even().clamp(0.0, 255.0) as u8;
    byte
}

/// Rescale `samples` into an 8-bit mask of the given dimensions.
///
/// Returns the mask together with the range it was scaled from.
///
/// # Errors
///
/// Returns [`CropError::NoContourFound`] if no sample is non-zero (there is
/// nothing to bound). Returns [`CropError::DegenerateNormalizationRange`]
/// if all non-zero samples are equal and `policy` is
/// [`Reject`](DegenerateRangePolicy::Reject). Returns
/// [`CropError::BufferSizeMismatch`] if `samples` does not cover
/// `dimensions`.
pub fn normalize_to_mask<T: Copy + Into<f64>>(
    samples: &[T],
    dimensions: Dimensions,
    policy: DegenerateRangePolicy,
) -> Result<(GrayImage, NormalizationRange), CropError> {
    let range = nonzero_range(samples).ok_or(CropError::NoContourFound)?;

    let data: Vec<u8> = if range.is_degenerate() {
        match policy {
            DegenerateRangePolicy::Reject => {
                return Err(CropError::DegenerateNormalizationRange {
                    min: range.min,
                    max: range.max,
                });
            }
            DegenerateRangePolicy::Binarize => samples
                .iter()
                .map(|&s| {
                    let v: f64 = s.into();
                    if v == 0.0 || v.is_nan() { 0 } else { u8::MAX }
                })
                .collect(),
        }
    } else {
        let scale = range.scale();
        let (min, max) = (range.min / scale, range.max / scale);
        let alpha = 255.0 / (max - min);
        let beta = -min * alpha;
        samples
            .iter()
            .map(|&s| saturate_u8((Into::<f64>::into(s) / scale).mul_add(alpha, beta)))
            .collect()
    };

    Ok((gray_from_raw(dimensions, data)?, range))
}

/// The contour mask for one image, plus what is needed to crop the
/// original afterwards.
#[derive(Debug)]
pub struct MaskedImage {
    mask: GrayImage,
    /// `None` when the mask *is* the original 8-bit storage.
    original: Option<PixelBuffer>,
    range: Option<NormalizationRange>,
}

impl MaskedImage {
    /// The 8-bit mask used for contour extraction.
    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Range the mask was rescaled from, `None` for 8-bit input.
    #[must_use]
    pub const fn range(&self) -> Option<NormalizationRange> {
        self.range
    }

    /// Recover the original, unnormalized image.
    #[must_use]
    pub fn into_original(self) -> PixelBuffer {
        match self.original {
            Some(original) => original,
            None => PixelBuffer::from_gray(self.mask),
        }
    }
}

/// Build the contour mask for a single-channel image.
///
/// For unsigned 8-bit input the sample vector is moved into the mask and
/// handed back unchanged by [`MaskedImage::into_original`], so the mask
/// aliases the input values.
///
/// # Errors
///
/// Returns [`CropError::UnsupportedChannelCount`] for multi-channel input,
/// and otherwise the errors of [`normalize_to_mask`].
pub fn into_mask(
    image: PixelBuffer,
    policy: DegenerateRangePolicy,
) -> Result<MaskedImage, CropError> {
    let format = image.format();
    if !format.is_single_channel() {
        return Err(CropError::UnsupportedChannelCount {
            channels: format.channels,
        });
    }
    let dimensions = image.dimensions();

    let samples = match (format.is_mono8(), image.into_samples()) {
        (true, Samples::U8(data)) => {
            return Ok(MaskedImage {
                mask: gray_from_raw(dimensions, data)?,
                original: None,
                range: None,
            });
        }
        (_, wide) => wide,
    };

    let (mask, range) = match &samples {
        Samples::U8(v) => normalize_to_mask(v, dimensions, policy)?,
        Samples::I8(v) => normalize_to_mask(v, dimensions, policy)?,
        Samples::U16(v) => normalize_to_mask(v, dimensions, policy)?,
        Samples::I16(v) => normalize_to_mask(v, dimensions, policy)?,
        Samples::I32(v) => normalize_to_mask(v, dimensions, policy)?,
        Samples::F32(v) => normalize_to_mask(v, dimensions, policy)?,
        Samples::F64(v) => normalize_to_mask(v, dimensions, policy)?,
    };

    Ok(MaskedImage {
        mask,
        original: Some(PixelBuffer::from_parts(dimensions, format.channels, samples)),
        range: Some(range),
    })
}

fn gray_from_raw(dimensions: Dimensions, data: Vec<u8>) -> Result<GrayImage, CropError> {
    let actual = data.len();
    GrayImage::from_raw(dimensions.width, dimensions.height, data).ok_or(
        CropError::BufferSizeMismatch {
            expected: dimensions.width as usize * dimensions.height as usize,
            actual,
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions::new(w, h)
    }

    #[test]
    fn range_skips_zero_and_non_finite() {
        let samples = [0.0_f32, 5.0, f32::NAN, 0.0, 2.5, f32::INFINITY, 9.0];
        let range = nonzero_range(&samples).unwrap();
        assert!((range.min - 2.5).abs() < f64::EPSILON);
        assert!((range.max - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn range_of_all_zero_is_none() {
        assert_eq!(nonzero_range(&[0_u16; 8]), None);
        assert_eq!(nonzero_range::<i32>(&[]), None);
    }

    #[test]
    fn saturate_clamps_and_rounds_half_even() {
        assert_eq!(saturate_u8(-12.0), 0);
        assert_eq!(saturate_u8(300.0), 255);
        assert_eq!(saturate_u8(f64::NAN), 0);
        assert_eq!(saturate_u8(f64::INFINITY), 255);
        assert_eq!(saturate_u8(2.5), 2);
        assert_eq!(saturate_u8(3.5), 4);
        assert_eq!(saturate_u8(127.4), 127);
    }

    #[test]
    fn rescales_min_to_zero_and_max_to_255() {
        let samples: [u16; 4] = [0, 1000, 1500, 3000];
        let (mask, range) =
            normalize_to_mask(&samples, dims(4, 1), DegenerateRangePolicy::Binarize).unwrap();
        assert!((range.min - 1000.0).abs() < f64::EPSILON);
        // 0 saturates up from a negative value; 1500 -> 63.75 -> 64
        assert_eq!(mask.as_raw(), &vec![0, 0, 64, 255]);
    }

    #[test]
    fn zero_maps_above_zero_with_negative_samples() {
        let samples: [i16; 3] = [-10, 0, 10];
        let (mask, _) =
            normalize_to_mask(&samples, dims(3, 1), DegenerateRangePolicy::Binarize).unwrap();
        // 0 * 12.75 + 127.5 = 127.5 -> 128
        assert_eq!(mask.as_raw(), &vec![0, 128, 255]);
    }

    #[test]
    fn overflowing_span_still_rescales() {
        let samples = [-1e308_f64, 0.0, 1e308];
        let (mask, range) =
            normalize_to_mask(&samples, dims(3, 1), DegenerateRangePolicy::Reject).unwrap();
        assert!(!range.is_degenerate());
        assert!(range.span().is_infinite());
        assert_eq!(mask.as_raw(), &vec![0, 128, 255]);
    }

    #[test]
    fn nan_samples_map_to_zero() {
        let samples = [1.0_f64, f64::NAN, 3.0];
        let (mask, _) =
            normalize_to_mask(&samples, dims(3, 1), DegenerateRangePolicy::Binarize).unwrap();
        assert_eq!(mask.as_raw(), &vec![0, 0, 255]);
    }

    #[test]
    fn all_zero_is_no_contour() {
        let result = normalize_to_mask(&[0.0_f32; 6], dims(3, 2), DegenerateRangePolicy::Binarize);
        assert!(matches!(result, Err(CropError::NoContourFound)));
    }

    #[test]
    fn degenerate_range_binarizes_by_default() {
        let samples = [0_i32, 42, 42, 0];
        let (mask, range) =
            normalize_to_mask(&samples, dims(2, 2), DegenerateRangePolicy::default()).unwrap();
        assert!(range.is_degenerate());
        assert_eq!(mask.as_raw(), &vec![0, 255, 255, 0]);
    }

    #[test]
    fn degenerate_range_can_be_rejected() {
        let samples = [0_i32, 42, 42, 0];
        let result = normalize_to_mask(&samples, dims(2, 2), DegenerateRangePolicy::Reject);
        assert_eq!(
            result.unwrap_err(),
            CropError::DegenerateNormalizationRange {
                min: 42.0,
                max: 42.0
            }
        );
    }

    #[test]
    fn mono8_mask_aliases_input() {
        let data = vec![0, 3, 0, 200, 1, 0];
        let image = PixelBuffer::mono8(3, 2, data.clone()).unwrap();
        let masked = into_mask(image, DegenerateRangePolicy::Reject).unwrap();
        assert_eq!(masked.mask().as_raw(), &data);
        assert_eq!(masked.range(), None);
        let original = masked.into_original();
        assert_eq!(original.samples(), &Samples::U8(data));
    }

    #[test]
    fn wide_input_keeps_original_samples() {
        let image = PixelBuffer::mono16(2, 1, vec![100, 200]).unwrap();
        let masked = into_mask(image.clone(), DegenerateRangePolicy::Binarize).unwrap();
        assert_eq!(masked.mask().as_raw(), &vec![0, 255]);
        assert_eq!(masked.into_original(), image);
    }

    #[test]
    fn multi_channel_is_rejected() {
        let image = PixelBuffer::new(1, 1, 3, Samples::U8(vec![1, 2, 3])).unwrap();
        let result = into_mask(image, DegenerateRangePolicy::Binarize);
        assert!(matches!(
            result,
            Err(CropError::UnsupportedChannelCount { channels: 3 })
        ));
    }
}
