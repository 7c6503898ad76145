//! Edge-preserving bilateral filter.
//!
//! Wraps [`imageproc::filter::bilateral_filter`] with a 9 pixel
//! diameter and sigma 75 for both the spatial and the color kernel.
//! Color similarity is the Gaussian of the Euclidean RGB distance.
//!
//! The filter runs on an `f32` copy of the image in the 0-255 range and
//! is rounded back to `u8` once at the end.

use image::Rgb32FImage;
use imageproc::filter::bilateral::GaussianEuclideanColorDistance;

use crate::color::saturate_u8;
use crate::types::RgbImage;

/// Neighbourhood diameter in pixels.
pub const DIAMETER: u32 = 9;

/// Standard deviation of the color-distance Gaussian.
pub const SIGMA_COLOR: f32 = 75.0;

/// Standard deviation of the spatial Gaussian.
pub const SIGMA_SPACE: f32 = 75.0;

/// Apply the bilateral filter to an RGB image.
#[must_use = "returns the filtered image"]
pub fn bilateral(image: &RgbImage) -> RgbImage {
    // Radius for DIAMETER = 9.
    let radius = 4;
    let wide = Rgb32FImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgb(image.get_pixel(x, y).0.map(f32::from))
    });
    let filtered = imageproc::filter::bilateral_filter(
        &wide,
        radius,
        SIGMA_SPACE,
        GaussianEuclideanColorDistance::new(SIGMA_COLOR),
    );
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgb(filtered.get_pixel(x, y).0.map(saturate_u8))
    })
}
