//! Wavelet-domain denoising of the luma plane.
//!
//! The source is split into YCrCb. The luma plane goes through a single
//! level 2-D Haar transform, each of the four sub-bands is
//! soft-thresholded with half its own standard deviation, and the plane
//! is reconstructed. Chroma is carried over untouched.
//!
//! Odd-sized planes are extended by repeating the last sample, so the
//! reconstruction can be one pixel larger than the input on either
//! axis. It is resampled back to the input size before recombining.

use std::f64::consts::FRAC_1_SQRT_2;

use image::imageops::FilterType;

use crate::color::{YCrCbPlanes, rgb_to_ycrcb, ycrcb_to_rgb};
use crate::types::{GrayImage, PipelineError, RgbImage};

/// Threshold as a fraction of each sub-band's standard deviation.
pub const THRESHOLD_FRACTION: f64 = 0.5;

/// A row-major plane of `f64` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Width in samples.
    pub width: usize,
    /// Height in samples.
    pub height: usize,
    /// Row-major samples, `width * height` long.
    pub data: Vec<f64>,
}

impl Plane {
    /// A zero-filled plane.
    #[must_use]
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Widen an 8-bit plane.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            data: image.as_raw().iter().map(|&v| f64::from(v)).collect(),
        }
    }

    /// Round and saturate to an 8-bit plane.
    ///
    /// Returns `None` if the plane is too large for `u32` dimensions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_gray(&self) -> Option<GrayImage> {
        let raw = self
            .data
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        GrayImage::from_raw(
            u32::try_from(self.width).ok()?,
            u32::try_from(self.height).ok()?,
            raw,
        )
    }

    fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, v: f64) {
        self.data[y * self.width + x] = v;
    }
}

/// The four sub-bands of a single-level 2-D decomposition.
///
/// The first letter is the filter applied along x, the second along y.
#[derive(Debug, Clone, PartialEq)]
pub struct HaarBands {
    /// Approximation.
    pub ll: Plane,
    /// Low along x, high along y.
    pub lh: Plane,
    /// High along x, low along y.
    pub hl: Plane,
    /// Diagonal detail.
    pub hh: Plane,
}

impl HaarBands {
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Plane> {
        [&mut self.ll, &mut self.lh, &mut self.hl, &mut self.hh].into_iter()
    }
}

/// One-dimensional Haar analysis. An odd trailing sample is paired with
/// itself.
fn analyze(input: &[f64]) -> (Vec<f64>, Vec<f64>) {
    input
        .chunks(2)
        .map(|pair| {
            let (a, b) = (pair[0], *pair.get(1).unwrap_or(&pair[0]));
            ((a + b) * FRAC_1_SQRT_2, (a - b) * FRAC_1_SQRT_2)
        })
        .unzip()
}

/// One-dimensional Haar synthesis, producing `2 * low.len()` samples.
fn synthesize(low: &[f64], high: &[f64]) -> Vec<f64> {
    low.iter()
        .zip(high)
        .flat_map(|(&a, &d)| [(a + d) * FRAC_1_SQRT_2, (a - d) * FRAC_1_SQRT_2])
        .collect()
}

/// Single-level 2-D Haar decomposition.
///
/// Each band is `ceil(width / 2) x ceil(height / 2)`.
#[must_use = "returns the sub-bands"]
pub fn haar_dwt2(plane: &Plane) -> HaarBands {
    let bw = plane.width.div_ceil(2);
    let bh = plane.height.div_ceil(2);

    // Along x.
    let mut low_x = Plane::zeros(bw, plane.height);
    let mut high_x = Plane::zeros(bw, plane.height);
    for (y, row) in plane.data.chunks(plane.width.max(1)).enumerate() {
        let (l, h) = analyze(row);
        for x in 0..bw {
            low_x.set(x, y, l[x]);
            high_x.set(x, y, h[x]);
        }
    }

    // Along y.
    let split_columns = |src: &Plane| {
        let mut low = Plane::zeros(bw, bh);
        let mut high = Plane::zeros(bw, bh);
        for x in 0..bw {
            let column: Vec<f64> = (0..src.height).map(|y| src.get(x, y)).collect();
            let (l, h) = analyze(&column);
            for y in 0..bh {
                low.set(x, y, l[y]);
                high.set(x, y, h[y]);
            }
        }
        (low, high)
    };

    let (ll, lh) = split_columns(&low_x);
    let (hl, hh) = split_columns(&high_x);
    HaarBands { ll, lh, hl, hh }
}

/// Inverse of [`haar_dwt2`].
///
/// The result is `2 * band_width x 2 * band_height`.
///
/// # Errors
///
/// Returns [`PipelineError::Wavelet`] if the four bands differ in size.
pub fn haar_idwt2(bands: &HaarBands) -> Result<Plane, PipelineError> {
    let (bw, bh) = (bands.ll.width, bands.ll.height);
    for band in [&bands.lh, &bands.hl, &bands.hh] {
        if (band.width, band.height) != (bw, bh) {
            return Err(PipelineError::Wavelet(format!(
                "sub-band is {}x{}, expected {bw}x{bh}",
                band.width, band.height
            )));
        }
    }

    // Along y.
    let merge_columns = |low: &Plane, high: &Plane| {
        let mut out = Plane::zeros(bw, 2 * bh);
        for x in 0..bw {
            let l: Vec<f64> = (0..bh).map(|y| low.get(x, y)).collect();
            let h: Vec<f64> = (0..bh).map(|y| high.get(x, y)).collect();
            for (y, v) in synthesize(&l, &h).into_iter().enumerate() {
                out.set(x, y, v);
            }
        }
        out
    };
    let low_x = merge_columns(&bands.ll, &bands.lh);
    let high_x = merge_columns(&bands.hl, &bands.hh);

    // Along x.
    let mut out = Plane::zeros(2 * bw, 2 * bh);
    for y in 0..2 * bh {
        let l = &low_x.data[y * bw..(y + 1) * bw];
        let h = &high_x.data[y * bw..(y + 1) * bw];
        out.data[y * 2 * bw..(y + 1) * 2 * bw].copy_from_slice(&synthesize(l, h));
    }
    Ok(out)
}

/// Shrink `x` toward zero by `threshold`, clamping to zero inside it.
#[must_use]
pub fn soft_threshold(x: f64, threshold: f64) -> f64 {
    x.signum() * (x.abs() - threshold).max(0.0)
}

/// Population standard deviation (`ddof = 0`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// Resample a plane to `width x height` with bilinear interpolation.
///
/// Float pixels are resampled in the unit range, so samples are scaled
/// from `0..=255` and back; anything outside saturates.
#[allow(clippy::cast_possible_truncation)]
fn resize_plane(plane: &Plane, width: u32, height: u32) -> Result<Plane, PipelineError> {
    let as_u32 = |n: usize| {
        u32::try_from(n).map_err(|_| PipelineError::Wavelet(format!("plane side {n} too large")))
    };
    let buffer: image::ImageBuffer<image::Luma<f32>, Vec<f32>> = image::ImageBuffer::from_raw(
        as_u32(plane.width)?,
        as_u32(plane.height)?,
        plane
            .data
            .iter()
            .map(|&v| (v / 255.0).clamp(0.0, 1.0) as f32)
            .collect(),
    )
    .ok_or_else(|| PipelineError::Wavelet("reconstruction buffer size mismatch".into()))?;

    let resized = image::imageops::resize(&buffer, width, height, FilterType::Triangle);
    Ok(Plane {
        width: width as usize,
        height: height as usize,
        data: resized
            .into_raw()
            .into_iter()
            .map(|v| f64::from(v) * 255.0)
            .collect(),
    })
}

/// Denoise the luma plane and return all three YCrCb planes.
///
/// The chroma planes are the unmodified conversion of `image`.
///
/// # Errors
///
/// Returns [`PipelineError::Wavelet`] if the inverse transform or the
/// resampling step fails.
pub fn wavelet_denoise_ycrcb(image: &RgbImage) -> Result<YCrCbPlanes, PipelineError> {
    let YCrCbPlanes { y, cr, cb } = rgb_to_ycrcb(image);

    let mut bands = haar_dwt2(&Plane::from_gray(&y));
    for band in bands.iter_mut() {
        let threshold = std_dev(&band.data) * THRESHOLD_FRACTION;
        for v in &mut band.data {
            *v = soft_threshold(*v, threshold);
        }
    }

    let mut luma = haar_idwt2(&bands)?;
    let (w, h) = y.dimensions();
    if (luma.width, luma.height) != (w as usize, h as usize) {
        luma = resize_plane(&luma, w, h)?;
    }

    let y = luma
        .to_gray()
        .ok_or_else(|| PipelineError::Wavelet("luma plane size mismatch".into()))?;
    Ok(YCrCbPlanes { y, cr, cb })
}

/// Wavelet soft-threshold denoising of an RGB image.
///
/// # Errors
///
/// See [`wavelet_denoise_ycrcb`].
pub fn wavelet_denoise(image: &RgbImage) -> Result<RgbImage, PipelineError> {
    Ok(ycrcb_to_rgb(&wavelet_denoise_ycrcb(image)?))
}
