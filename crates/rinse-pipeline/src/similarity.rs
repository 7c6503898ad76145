//! Structural similarity (SSIM) scoring.
//!
//! [`SimilarityScorer`] is the capability the pipeline ranks candidates
//! with. [`Ssim`] is the shipped implementation:
//!
//! - square windows of [`DEFAULT_WINDOW`] pixels with uniform weights,
//! - `K1 = 0.01`, `K2 = 0.03`, data range 255,
//! - sample (co)variances, scaled by `N / (N - 1)` for `N` window pixels,
//! - the SSIM map is averaged over every window that lies fully inside
//!   the image (a `(window - 1) / 2` border is cropped),
//! - each channel is scored separately and the channel scores are
//!   averaged with equal weight.
//!
//! Window sums come from integral images, so scoring costs a constant
//! number of operations per pixel regardless of the window size.

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, PipelineError, RgbImage};

/// Default window side length.
pub const DEFAULT_WINDOW: u32 = 7;

/// Luminance stabiliser coefficient.
pub const K1: f64 = 0.01;

/// Contrast stabiliser coefficient.
pub const K2: f64 = 0.03;

/// Dynamic range of 8-bit samples.
pub const DATA_RANGE: f64 = 255.0;

/// Scores how similar a candidate is to a reference raster.
///
/// Higher is more similar. Implementations must be deterministic.
pub trait SimilarityScorer {
    /// Compare `candidate` against `reference`.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] if the two rasters cannot be compared.
    fn score(&self, reference: &RgbImage, candidate: &RgbImage) -> Result<f64, PipelineError>;
}

/// Windowed multichannel SSIM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ssim {
    /// Window side length in pixels (odd, at least 3).
    pub window: u32,
}

impl Default for Ssim {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

impl Ssim {
    /// Per-channel mean SSIM in R, G, B order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidWindow`] for an even or too small
    /// window, [`PipelineError::SizeMismatch`] if the rasters differ in
    /// size, and [`PipelineError::ImageTooSmall`] if either side is
    /// shorter than the window.
    pub fn channel_scores(
        &self,
        reference: &RgbImage,
        candidate: &RgbImage,
    ) -> Result<[f64; 3], PipelineError> {
        if self.window < 3 || self.window.is_multiple_of(2) {
            return Err(PipelineError::InvalidWindow(self.window));
        }
        if reference.dimensions() != candidate.dimensions() {
            return Err(PipelineError::SizeMismatch {
                reference: Dimensions::of(reference),
                candidate: Dimensions::of(candidate),
            });
        }
        let (width, height) = reference.dimensions();
        if width < self.window || height < self.window {
            return Err(PipelineError::ImageTooSmall {
                width,
                height,
                min: self.window,
            });
        }

        Ok(std::array::from_fn(|c| {
            mean_ssim(reference, candidate, c, self.window)
        }))
    }
}

impl SimilarityScorer for Ssim {
    fn score(&self, reference: &RgbImage, candidate: &RgbImage) -> Result<f64, PipelineError> {
        let channels = self.channel_scores(reference, candidate)?;
        Ok(channels.iter().sum::<f64>() / 3.0)
    }
}

/// Integral images of the five moments SSIM needs for one channel.
struct Moments {
    stride: usize,
    x: Vec<f64>,
    y: Vec<f64>,
    xx: Vec<f64>,
    yy: Vec<f64>,
    xy: Vec<f64>,
}

impl Moments {
    fn new(a: &RgbImage, b: &RgbImage, channel: usize) -> Self {
        let (w, h) = (a.width() as usize, a.height() as usize);
        let stride = w + 1;
        let len = stride * (h + 1);
        let mut m = Self {
            stride,
            x: vec![0.0; len],
            y: vec![0.0; len],
            xx: vec![0.0; len],
            yy: vec![0.0; len],
            xy: vec![0.0; len],
        };

        let (ra, rb) = (a.as_raw(), b.as_raw());
        for row in 0..h {
            let mut acc = [0.0f64; 5];
            for col in 0..w {
                let i = (row * w + col) * 3 + channel;
                let (p, q) = (f64::from(ra[i]), f64::from(rb[i]));
                acc[0] += p;
                acc[1] += q;
                acc[2] += p * p;
                acc[3] += q * q;
                acc[4] += p * q;

                let here = (row + 1) * stride + col + 1;
                let above = row * stride + col + 1;
                m.x[here] = m.x[above] + acc[0];
                m.y[here] = m.y[above] + acc[1];
                m.xx[here] = m.xx[above] + acc[2];
                m.yy[here] = m.yy[above] + acc[3];
                m.xy[here] = m.xy[above] + acc[4];
            }
        }
        m
    }

    /// Sum of `table` over the `size x size` window with top-left corner
    /// `(col, row)`.
    fn window_sum(&self, table: &[f64], col: usize, row: usize, size: usize) -> f64 {
        let s = self.stride;
        table[(row + size) * s + col + size] - table[row * s + col + size]
            - table[(row + size) * s + col]
            + table[row * s + col]
    }
}

/// Mean SSIM of one channel over all windows fully inside the image.
#[allow(clippy::cast_precision_loss, clippy::similar_names)]
fn mean_ssim(a: &RgbImage, b: &RgbImage, channel: usize, window: u32) -> f64 {
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);
    let size = window as usize;
    let np = (size * size) as f64;
    let cov_norm = np / (np - 1.0);

    let m = Moments::new(a, b, channel);
    let (w, h) = (a.width() as usize, a.height() as usize);

    let mut total = 0.0;
    let mut count = 0usize;
    for row in 0..=h - size {
        for col in 0..=w - size {
            let ux = m.window_sum(&m.x, col, row, size) / np;
            let uy = m.window_sum(&m.y, col, row, size) / np;
            let uxx = m.window_sum(&m.xx, col, row, size) / np;
            let uyy = m.window_sum(&m.yy, col, row, size) / np;
            let uxy = m.window_sum(&m.xy, col, row, size) / np;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let a1 = 2.0 * ux * uy + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux * ux + uy * uy + c1;
            let b2 = vx + vy + c2;

            total += (a1 * a2) / (b1 * b2);
            count += 1;
        }
    }

    total / count as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn textured(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([
                ((x * 31 + y * 17) % 256) as u8,
                ((x * y * 7) % 256) as u8,
                ((x ^ y) * 9 % 256) as u8,
            ])
        })
    }

    #[test]
    fn identical_images_score_one() {
        let img = textured(20, 16);
        let s = Ssim::default().score(&img, &img).unwrap();
        assert!((s - 1.0).abs() < 1e-12, "got {s}");
    }

    #[test]
    fn identical_black_images_score_exactly_one() {
        let img = RgbImage::new(64, 64);
        let s = Ssim::default().score(&img, &img).unwrap();
        assert_eq!(s.to_bits(), 1.0f64.to_bits());
    }

    #[test]
    fn perturbation_lowers_score() {
        let img = textured(24, 24);
        let mut noisy = img.clone();
        for (i, p) in noisy.pixels_mut().enumerate() {
            let delta: u8 = if i % 3 == 0 { 40 } else { 0 };
            p.0 = p.0.map(|v| v.saturating_add(delta));
        }
        let ssim = Ssim::default();
        let s = ssim.score(&img, &noisy).unwrap();
        assert!(s < 1.0, "got {s}");
        assert!(s > -1.0, "got {s}");
    }

    #[test]
    fn score_is_symmetric() {
        let a = textured(12, 12);
        let b = RgbImage::from_fn(12, 12, |x, y| image::Rgb([(x * 20) as u8, (y * 20) as u8, 128]));
        let ssim = Ssim::default();
        let ab = ssim.score(&a, &b).unwrap();
        let ba = ssim.score(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn matches_direct_window_computation() {
        // 7x7 image: exactly one window, computed by hand.
        let a = textured(7, 7);
        let b = RgbImage::from_fn(7, 7, |x, y| image::Rgb([(x * 30) as u8, (y * 30) as u8, 77]));
        let scores = Ssim::default().channel_scores(&a, &b).unwrap();

        for (c, &score) in scores.iter().enumerate() {
            let xs: Vec<f64> = a.pixels().map(|p| f64::from(p.0[c])).collect();
            let ys: Vec<f64> = b.pixels().map(|p| f64::from(p.0[c])).collect();
            let n = 49.0;
            let mx = xs.iter().sum::<f64>() / n;
            let my = ys.iter().sum::<f64>() / n;
            let vx = xs.iter().map(|v| (v - mx).powi(2)).sum::<f64>() / (n - 1.0);
            let vy = ys.iter().map(|v| (v - my).powi(2)).sum::<f64>() / (n - 1.0);
            let cxy = xs
                .iter()
                .zip(&ys)
                .map(|(x, y)| (x - mx) * (y - my))
                .sum::<f64>()
                / (n - 1.0);
            let c1 = (0.01f64 * 255.0).powi(2);
            let c2 = (0.03f64 * 255.0).powi(2);
            let expected = ((2.0 * mx * my + c1) * (2.0 * cxy + c2))
                / ((mx * mx + my * my + c1) * (vx + vy + c2));
            assert!((score - expected).abs() < 1e-9, "channel {c}: {score} vs {expected}");
        }
    }

    #[test]
    fn too_small_is_rejected() {
        let img = RgbImage::new(6, 20);
        assert!(matches!(
            Ssim::default().score(&img, &img),
            Err(PipelineError::ImageTooSmall { min: 7, .. })
        ));
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let a = RgbImage::new(10, 10);
        let b = RgbImage::new(10, 11);
        assert!(matches!(
            Ssim::default().score(&a, &b),
            Err(PipelineError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn even_window_is_rejected() {
        let img = RgbImage::new(10, 10);
        assert!(matches!(
            Ssim { window: 6 }.score(&img, &img),
            Err(PipelineError::InvalidWindow(6))
        ));
    }
}
