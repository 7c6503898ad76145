//! Median blur with a 5x5 aperture.
//!
//! Wraps [`imageproc::filter::median_filter`], which takes the median of
//! each channel independently over a `(2r + 1) x (2r + 1)` window.

use crate::types::RgbImage;

/// Aperture side length.
pub const APERTURE: u32 = 5;

/// Apply a 5x5 median blur to every channel of an RGB image.
#[must_use = "returns the filtered image"]
pub fn median_blur(image: &RgbImage) -> RgbImage {
    let radius = APERTURE / 2;
    imageproc::filter::median_filter(image, radius, radius)
}
