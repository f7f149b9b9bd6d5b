//! nzcrop-core: crop single-channel images to their non-zero region (sans-IO).
//!
//! Finds the bounding rectangle of the largest non-zero region of a
//! grayscale, depth, or float image through:
//! normalize to an 8-bit mask -> external contour tracing ->
//! largest contour by point count -> bounding rectangle -> crop.
//!
//! This crate has **no I/O dependencies**: it takes an in-memory
//! [`PixelBuffer`] plus opaque caller metadata and returns a
//! [`CroppedImage`]. Decoding wire messages and logging dropped frames
//! live in `nzcrop-node`.
//!
//! ```rust
//! # use nzcrop_core::{BoundingRect, NonZeroCropper, PixelBuffer};
//! # fn run() -> Result<(), nzcrop_core::CropError> {
//! let mut depth = vec![0_u16; 8 * 6];
//! for y in 1..4 {
//!     for x in 2..7 {
//!         depth[y * 8 + x] = 1200;
//!     }
//! }
//! let image = PixelBuffer::mono16(8, 6, depth)?;
//!
//! let cropped = NonZeroCropper::default().crop(image, "frame-0")?;
//! assert_eq!(cropped.rect, BoundingRect::new(2, 1, 5, 3));
//! assert_eq!(cropped.header, "frame-0");
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

pub mod buffer;
pub mod contour;
mod crop;
pub mod diagnostics;
pub mod format;
pub mod normalize;
pub mod types;

pub use buffer::{PixelBuffer, Samples};
pub use contour::{Contour, ContourTracer, ContourTracerKind};
pub use crop::NonZeroCropper;
pub use format::{Depth, PixelFormat};
pub use types::{
    BoundingRect, CropConfig, CropError, CroppedImage, DegenerateRangePolicy, Dimensions,
    PixelPoint,
};

/// Crop `image` with the default configuration.
///
/// Shorthand for `NonZeroCropper::default().crop(image, header)`.
///
/// # Errors
///
/// See [`NonZeroCropper::crop`].
pub fn crop<H>(image: PixelBuffer, header: H) -> Result<CroppedImage<H>, CropError> {
    NonZeroCropper::default().crop(image, header)
}
