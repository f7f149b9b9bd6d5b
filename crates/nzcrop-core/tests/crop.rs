//! End-to-end behavior of the non-zero cropper on synthetic images.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use nzcrop_core::{BoundingRect, CropError, NonZeroCropper, PixelBuffer, PixelFormat, Samples};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    stamp_ns: u64,
    frame_id: String,
}

fn header() -> Header {
    Header {
        stamp_ns: 1_700_000_000_123,
        frame_id: "depth_optical".to_owned(),
    }
}

/// Row-major samples of a `width` x `height` image from `f(x, y)`.
fn grid<T>(width: u32, height: u32, f: impl Fn(u32, u32) -> T) -> Vec<T> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| f(x, y))
        .collect()
}

fn inside(rect: BoundingRect, x: u32, y: u32) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

#[test]
fn mono8_block_is_cropped_exactly() {
    let rect = BoundingRect::new(5, 3, 7, 4);
    let data = grid(20, 12, |x, y| {
        if inside(rect, x, y) {
            u8::try_from(10 + x + y).unwrap()
        } else {
            0
        }
    });
    let image = PixelBuffer::mono8(20, 12, data).unwrap();

    let out = NonZeroCropper::default().crop(image, header()).unwrap();

    assert_eq!(out.rect, rect);
    assert_eq!(out.header, header());
    assert_eq!(out.header.frame_id, "depth_optical");
    assert_eq!(out.header.stamp_ns, 1_700_000_000_123);
    assert_eq!(out.image.format(), PixelFormat::MONO8);
    let expected = grid(7, 4, |x, y| u8::try_from(10 + (x + 5) + (y + 3)).unwrap());
    assert_eq!(out.image.samples(), &Samples::U8(expected));
}

#[test]
fn multi_channel_is_rejected() {
    let image = PixelBuffer::new(4, 4, 3, Samples::U8(vec![255; 48])).unwrap();
    let result = NonZeroCropper::default().crop(image, header());
    assert_eq!(
        result.unwrap_err(),
        CropError::UnsupportedChannelCount { channels: 3 }
    );
}

#[test]
fn all_zero_mono8_has_no_contour() {
    let image = PixelBuffer::mono8(16, 16, vec![0; 256]).unwrap();
    let result = NonZeroCropper::default().crop(image, header());
    assert_eq!(result.unwrap_err(), CropError::NoContourFound);
}

#[test]
fn all_zero_float_has_no_contour() {
    let image = PixelBuffer::float32(16, 16, vec![0.0; 256]).unwrap();
    let result = NonZeroCropper::default().crop(image, header());
    assert_eq!(result.unwrap_err(), CropError::NoContourFound);
}

#[test]
fn float_normalization_ignores_zero_pixels() {
    // Central region with values 1..=100 rising left to right; zero elsewhere.
    let region = BoundingRect::new(8, 6, 10, 10);
    let value = |x: u32, y: u32| -> f32 {
        if inside(region, x, y) {
            #[allow(clippy::cast_precision_loss)]
            let v = 1.0 + (x - region.x) as f32 * 11.0;
            v
        } else {
            0.0
        }
    };
    let float = PixelBuffer::float32(24, 24, grid(24, 24, value)).unwrap();

    // Pre-normalized 8-bit version: min/max taken over non-zero pixels only.
    let (min, max) = (1.0_f64, 100.0_f64);
    let reference = grid(24, 24, |x, y| {
        let v = f64::from(value(x, y));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let byte = ((v - min) * 255.0 / (max - min)).round().clamp(0.0, 255.0) as u8;
        byte
    });
    let reference = PixelBuffer::mono8(24, 24, reference).unwrap();

    let cropper = NonZeroCropper::default();
    let from_float = cropper.crop(float, ()).unwrap();
    let from_reference = cropper.crop(reference, ()).unwrap();

    assert_eq!(from_float.rect, from_reference.rect);
    // The minimum-valued column maps to 0 and drops out; with zero pixels
    // included in the range it would have stayed in.
    assert_eq!(from_float.rect, BoundingRect::new(9, 6, 9, 10));

    // The crop keeps the original float samples.
    let Samples::F32(samples) = from_float.image.samples() else {
        panic!("expected f32 samples, got {:?}", from_float.image.format());
    };
    assert!((samples[0] - 12.0).abs() < f32::EPSILON);
    assert!((samples[8] - 100.0).abs() < f32::EPSILON);
}

#[test]
fn cropping_a_crop_is_idempotent() {
    let rect = BoundingRect::new(2, 9, 11, 5);
    let data = grid(16, 16, |x, y| if inside(rect, x, y) { 77 } else { 0 });
    let cropper = NonZeroCropper::default();

    let once = cropper
        .crop(PixelBuffer::mono8(16, 16, data).unwrap(), ())
        .unwrap();
    let twice = cropper.crop(once.image.clone(), ()).unwrap();

    assert_eq!(twice.rect, BoundingRect::full(once.image.dimensions()));
    assert_eq!(twice.image, once.image);
}

#[test]
fn constant_depth_is_idempotent_when_binarized() {
    let rect = BoundingRect::new(4, 4, 6, 3);
    let data = grid(12, 12, |x, y| if inside(rect, x, y) { 850_u16 } else { 0 });
    let cropper = NonZeroCropper::default();

    let once = cropper
        .crop(PixelBuffer::mono16(12, 12, data).unwrap(), ())
        .unwrap();
    assert_eq!(once.rect, rect);
    let twice = cropper.crop(once.image.clone(), ()).unwrap();
    assert_eq!(twice.rect, BoundingRect::full(rect.dimensions()));
    assert_eq!(twice.image, once.image);
}

/// Two filled blocks: a 3x4 block (10 boundary points) and a 6x6 block
/// (20 boundary points). `small_first` puts the small block earlier in
/// raster order so it is discovered first.
fn two_blocks(small_first: bool) -> (PixelBuffer, BoundingRect) {
    let (small, large) = if small_first {
        (BoundingRect::new(1, 1, 3, 4), BoundingRect::new(10, 8, 6, 6))
    } else {
        (BoundingRect::new(12, 12, 3, 4), BoundingRect::new(2, 1, 6, 6))
    };
    let data = grid(20, 20, |x, y| {
        if inside(small, x, y) || inside(large, x, y) {
            255
        } else {
            0
        }
    });
    (PixelBuffer::mono8(20, 20, data).unwrap(), large)
}

#[test]
fn larger_contour_wins_regardless_of_order() {
    let cropper = NonZeroCropper::default();
    for small_first in [true, false] {
        let (image, large) = two_blocks(small_first);
        let out = cropper.crop(image, ()).unwrap();
        assert_eq!(out.rect, large, "small_first={small_first}");
    }
}

#[test]
fn equal_contours_keep_first_discovered() {
    let first = BoundingRect::new(1, 1, 6, 6);
    let second = BoundingRect::new(10, 10, 6, 6);
    let data = grid(20, 20, |x, y| {
        if inside(first, x, y) || inside(second, x, y) {
            1
        } else {
            0
        }
    });
    let out = NonZeroCropper::default()
        .crop(PixelBuffer::mono8(20, 20, data).unwrap(), ())
        .unwrap();
    assert_eq!(out.rect, first);
}

#[test]
fn signed_depth_zero_maps_to_mid_gray() {
    // With negative samples present a zero pixel lands mid-range, so zeros
    // become foreground and only the minimum column drops out.
    let data = grid(6, 4, |x, _| match x {
        2 => -40_i16,
        3 => 40,
        _ => 0,
    });
    let image = PixelBuffer::new(6, 4, 1, Samples::I16(data)).unwrap();
    let out = NonZeroCropper::default().crop(image, ()).unwrap();
    // Columns 0..2 and 3..6 are separate regions; the wider one wins.
    assert_eq!(out.rect, BoundingRect::new(3, 0, 3, 4));
    let expected = grid(3, 4, |x, _| if x == 0 { 40 } else { 0 });
    assert_eq!(out.image.samples(), &Samples::I16(expected));
}

#[test]
fn cropper_is_shareable_across_threads() {
    let cropper = NonZeroCropper::default();
    let rect = BoundingRect::new(3, 3, 4, 4);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cropper = &cropper;
                scope.spawn(move || {
                    let data = grid(10, 10, |x, y| u8::from(inside(rect, x, y)));
                    cropper
                        .crop(PixelBuffer::mono8(10, 10, data).unwrap(), ())
                        .unwrap()
                        .rect
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), rect);
        }
    });
}

#[test]
fn left_edge_region_is_cropped() {
    // A 1-pixel strip on column 0 plus a larger interior block.
    let block = BoundingRect::new(5, 1, 4, 3);
    let data = grid(10, 5, |x, y| u8::from(x == 0 || inside(block, x, y)) * 200);
    let cropper = NonZeroCropper::default();

    let out = cropper
        .crop(PixelBuffer::mono8(10, 5, data).unwrap(), ())
        .unwrap();
    assert_eq!(out.rect, block);

    let strip = PixelBuffer::mono16(1, 4, vec![7, 7, 7, 7]).unwrap();
    let out = cropper.crop(strip, ()).unwrap();
    assert_eq!(out.rect, BoundingRect::new(0, 0, 1, 4));
}
