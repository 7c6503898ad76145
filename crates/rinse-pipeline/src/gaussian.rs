//! 5x5 Gaussian blur.
//!
//! Wraps [`imageproc::filter::filter`] with the 5x5 outer product of the
//! binomial taps `[1, 4, 6, 4, 1] / 16`, the Gaussian kernel a 5x5
//! aperture gets when no explicit sigma is requested. Every channel is
//! accumulated in `f32` and rounded to `u8` once.

use imageproc::kernel::Kernel;

use crate::color::saturate_u8;
use crate::types::RgbImage;

/// Kernel side length.
pub const KERNEL_SIZE: usize = 5;

/// Normalised binomial taps. Every tap is a power-of-two fraction, so a
/// flat region stays exactly flat.
pub const KERNEL: [f32; KERNEL_SIZE] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Apply the 5x5 Gaussian blur to an RGB image.
///
/// Edge pixels are handled by clamping to the border.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_5x5(image: &RgbImage) -> RgbImage {
    let taps = kernel_2d();
    let kernel = Kernel::new(&taps, 5, 5);
    imageproc::filter::filter(image, kernel, saturate_u8)
}

/// Row-major 5x5 kernel. Each entry is `k / 256` and exact in `f32`.
fn kernel_2d() -> [f32; KERNEL_SIZE * KERNEL_SIZE] {
    std::array::from_fn(|i| KERNEL[i / KERNEL_SIZE] * KERNEL[i % KERNEL_SIZE])
}
