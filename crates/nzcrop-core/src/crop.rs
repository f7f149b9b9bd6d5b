//! The non-zero cropper: normalize -> trace -> select -> bound -> crop.

use crate::buffer::PixelBuffer;
use crate::contour::{ContourTracer, ContourTracerKind, largest_index, select_largest};
use crate::diagnostics::{
    Clock, CropDiagnostics, CropSummary, StageDiagnostics, StageMetrics, contour_metrics,
    count_mask_pixels, retained_fraction,
};
use crate::normalize::into_mask;
use crate::types::{BoundingRect, CropConfig, CropError, CroppedImage};

/// Crops single-channel images to the bounding box of their largest
/// non-zero region.
///
/// The cropper holds only configuration. Each call owns its input, keeps
/// no state between calls, and may run concurrently with other calls on
/// other inputs.
#[derive(Debug, Clone)]
pub struct NonZeroCropper<T = ContourTracerKind> {
    config: CropConfig,
    tracer: T,
}

impl NonZeroCropper {
    /// Create a cropper using the tracer selected in `config`.
    #[must_use]
    pub const fn new(config: CropConfig) -> Self {
        Self {
            tracer: config.contour_tracer,
            config,
        }
    }
}

impl Default for NonZeroCropper {
    fn default() -> Self {
        Self::new(CropConfig::default())
    }
}

impl<T: ContourTracer> NonZeroCropper<T> {
    /// Create a cropper with a custom contour tracer.
    ///
    /// `config.contour_tracer` is ignored.
    #[must_use]
    pub const fn with_tracer(config: CropConfig, tracer: T) -> Self {
        Self { config, tracer }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &CropConfig {
        &self.config
    }

    /// Crop `image` to the bounding rectangle of its largest non-zero
    /// region.
    ///
    /// The result keeps the source depth and carries `header` through
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - [`CropError::UnsupportedChannelCount`] if `image` has more than
    ///   one channel. Nothing is produced.
    /// - [`CropError::NoContourFound`] if the image has no non-zero region.
    /// - [`CropError::DegenerateNormalizationRange`] if all non-zero
    ///   samples are equal and the policy rejects that.
    pub fn crop<H>(&self, image: PixelBuffer, header: H) -> Result<CroppedImage<H>, CropError> {
        let masked = into_mask(image, self.config.degenerate_range)?;
        let contours = self.tracer.trace(masked.mask());
        let rect = select_largest(&contours)
            .and_then(|c| c.bounding_rect())
            .ok_or(CropError::NoContourFound)?;
        let image = masked.into_original().extract(rect)?;
        Ok(CroppedImage {
            image,
            rect,
            header,
        })
    }

    /// Bounding rectangle that [`crop`](Self::crop) would keep, without
    /// copying any pixels.
    ///
    /// # Errors
    ///
    /// Same as [`crop`](Self::crop).
    pub fn locate(&self, image: PixelBuffer) -> Result<BoundingRect, CropError> {
        let masked = into_mask(image, self.config.degenerate_range)?;
        let contours = self.tracer.trace(masked.mask());
        select_largest(&contours)
            .and_then(|c| c.bounding_rect())
            .ok_or(CropError::NoContourFound)
    }

    /// Like [`crop`](Self::crop), also returning per-stage diagnostics
    /// timed with `clock`.
    ///
    /// # Errors
    ///
    /// Same as [`crop`](Self::crop).
    pub fn crop_with_diagnostics<H, C: Clock>(
        &self,
        image: PixelBuffer,
        header: H,
        clock: &C,
    ) -> Result<(CroppedImage<H>, CropDiagnostics), CropError> {
        let total_start = clock.now();
        let dimensions = image.dimensions();
        let source_format = image.format();

        // 1. Mask.
        let start = clock.now();
        let masked = into_mask(image, self.config.degenerate_range)?;
        let normalize = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::Normalize {
                source_format,
                passthrough: masked.range().is_none(),
                range: masked.range(),
                mask_nonzero_count: count_mask_pixels(masked.mask()),
            },
        };

        // 2. Contours.
        let start = clock.now();
        let contours = self.tracer.trace(masked.mask());
        let contour_tracing = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: contour_metrics(&contours),
        };

        // 3. Largest contour and its bounds.
        let start = clock.now();
        let selected_index = largest_index(&contours).ok_or(CropError::NoContourFound)?;
        let selected = &contours[selected_index];
        let rect = selected.bounding_rect().ok_or(CropError::NoContourFound)?;
        let selection = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::Selection {
                selected_index,
                selected_point_count: selected.len(),
                rect,
            },
        };

        // 4. Copy the region out of the source.
        let start = clock.now();
        let image = masked.into_original().extract(rect)?;
        let extraction = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::Extraction {
                width: rect.width,
                height: rect.height,
                retained_fraction: retained_fraction(rect, dimensions.pixel_count()),
            },
        };

        let diagnostics = CropDiagnostics {
            normalize,
            contour_tracing,
            selection,
            extraction,
            total_duration: clock.elapsed(&total_start),
            summary: CropSummary {
                image_width: dimensions.width,
                image_height: dimensions.height,
                pixel_count: dimensions.pixel_count(),
                contour_count: contours.len(),
                rect,
            },
        };

        Ok((
            CroppedImage {
                image,
                rect,
                header,
            },
            diagnostics,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::buffer::Samples;
    use crate::contour::Contour;
    use crate::diagnostics::SystemClock;
    use crate::types::{DegenerateRangePolicy, GrayImage, PixelPoint};

    /// Tracer returning a fixed contour list, for exercising selection
    /// independently of border following.
    struct Fixed(Vec<Contour>);

    impl ContourTracer for Fixed {
        fn trace(&self, _mask: &GrayImage) -> Vec<Contour> {
            self.0.clone()
        }
    }

    fn column(x: u32, n: u32) -> Contour {
        Contour::new((0..n).map(|y| PixelPoint::new(x, y)).collect())
    }

    fn block_u8(width: u32, height: u32, rect: BoundingRect, value: u8) -> PixelBuffer {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| {
                let inside = x >= rect.x
                    && x < rect.x + rect.width
                    && y >= rect.y
                    && y < rect.y + rect.height;
                if inside { value } else { 0 }
            })
            .collect();
        PixelBuffer::mono8(width, height, data).unwrap()
    }

    #[test]
    fn header_passes_through() {
        let rect = BoundingRect::new(2, 2, 3, 3);
        let cropper = NonZeroCropper::default();
        let out = cropper.crop(block_u8(8, 8, rect, 9), ("cam0", 42_u64)).unwrap();
        assert_eq!(out.header, ("cam0", 42));
        assert_eq!(out.rect, rect);
    }

    #[test]
    fn locate_matches_crop() {
        let rect = BoundingRect::new(1, 4, 5, 2);
        let cropper = NonZeroCropper::default();
        let located = cropper.locate(block_u8(10, 10, rect, 1)).unwrap();
        assert_eq!(located, rect);
    }

    #[test]
    fn selection_prefers_more_points_in_any_order() {
        let img = PixelBuffer::mono8(30, 30, vec![1; 900]).unwrap();
        for contours in [
            vec![column(3, 10), column(7, 20)],
            vec![column(7, 20), column(3, 10)],
        ] {
            let cropper = NonZeroCropper::with_tracer(CropConfig::default(), Fixed(contours));
            let out = cropper.crop(img.clone(), ()).unwrap();
            assert_eq!(out.rect, BoundingRect::new(7, 0, 1, 20));
        }
    }

    #[test]
    fn selection_tie_keeps_first_discovered() {
        let img = PixelBuffer::mono8(30, 30, vec![1; 900]).unwrap();
        let cropper = NonZeroCropper::with_tracer(
            CropConfig::default(),
            Fixed(vec![column(5, 20), column(9, 20)]),
        );
        let out = cropper.crop(img, ()).unwrap();
        assert_eq!(out.rect, BoundingRect::new(5, 0, 1, 20));
    }

    #[test]
    fn tracer_with_no_contours_is_no_contour_found() {
        let img = PixelBuffer::mono8(4, 4, vec![1; 16]).unwrap();
        let cropper = NonZeroCropper::with_tracer(CropConfig::default(), Fixed(Vec::new()));
        assert_eq!(cropper.crop(img, ()).unwrap_err(), CropError::NoContourFound);
    }

    #[test]
    fn degenerate_policy_is_honored() {
        let mut data = vec![0_u16; 36];
        for i in [14, 15, 20, 21] {
            data[i] = 500;
        }
        let img = PixelBuffer::mono16(6, 6, data).unwrap();

        let binarize = NonZeroCropper::default().crop(img.clone(), ()).unwrap();
        assert_eq!(binarize.rect, BoundingRect::new(2, 2, 2, 2));
        assert_eq!(binarize.image.samples(), &Samples::U16(vec![500; 4]));

        let reject = NonZeroCropper::new(CropConfig {
            degenerate_range: DegenerateRangePolicy::Reject,
            ..CropConfig::default()
        });
        assert_eq!(
            reject.crop(img, ()).unwrap_err(),
            CropError::DegenerateNormalizationRange {
                min: 500.0,
                max: 500.0
            }
        );
    }

    #[test]
    fn diagnostics_agree_with_crop() {
        let rect = BoundingRect::new(3, 1, 4, 6);
        let img = block_u8(12, 9, rect, 200);
        let cropper = NonZeroCropper::default();
        let plain = cropper.crop(img.clone(), ()).unwrap();
        let (with_diag, diagnostics) = cropper
            .crop_with_diagnostics(img, (), &SystemClock)
            .unwrap();
        assert_eq!(plain, with_diag);
        assert_eq!(diagnostics.summary.rect, rect);
        assert_eq!(diagnostics.summary.contour_count, 1);
        assert!(matches!(
            diagnostics.normalize.metrics,
            StageMetrics::Normalize {
                passthrough: true,
                mask_nonzero_count: 24,
                ..
            }
        ));
        assert!(diagnostics.total_duration >= diagnostics.extraction.duration);
    }

    #[test]
    fn diagnostics_report_errors_like_crop() {
        let img = PixelBuffer::new(2, 2, 2, Samples::U8(vec![1; 8])).unwrap();
        let result = NonZeroCropper::default().crop_with_diagnostics(img, (), &SystemClock);
        assert!(matches!(
            result,
            Err(CropError::UnsupportedChannelCount { channels: 2 })
        ));
    }
}
