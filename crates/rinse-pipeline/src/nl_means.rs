//! Non-local means denoising for color images.
//!
//! Each output pixel is a weighted average of the pixels in a search
//! window around it, weighted by how similar the surrounding template
//! patches are:
//!
//! ```text
//! d²(p, q) = Σ_channels Σ_template (P(p + t) - P(q + t))² / (T² · channels)
//! w(p, q)  = exp(-d²(p, q) / h²)
//! out(p)   = Σ_q w(p, q) · P(q) / Σ_q w(p, q)
//! ```
//!
//! The source is split into YCrCb; luma is denoised on its own with
//! strength [`H_LUMA`] and the two chroma planes are denoised together
//! with strength [`H_CHROMA`].
//!
//! Patch distances are evaluated per search offset with an integral
//! image of squared differences, so the cost per pixel is proportional
//! to the search area and independent of the template size. Borders are
//! reflected without repeating the edge sample (`dcb|abcd|cba`).

use crate::color::{YCrCbPlanes, rgb_to_ycrcb, ycrcb_to_rgb};
use crate::types::{GrayImage, RgbImage};

/// Filter strength for the luma plane.
pub const H_LUMA: f64 = 10.0;

/// Filter strength for the chroma planes.
pub const H_CHROMA: f64 = 10.0;

/// Template (patch) side length.
pub const TEMPLATE_WINDOW: u32 = 7;

/// Search window side length.
pub const SEARCH_WINDOW: u32 = 21;

/// Denoise an RGB image with non-local means in YCrCb space.
#[must_use = "returns the denoised image"]
pub fn nl_means_colored(image: &RgbImage) -> RgbImage {
    let planes = rgb_to_ycrcb(image);

    let [y] = nl_means_planes([&planes.y], H_LUMA, TEMPLATE_WINDOW, SEARCH_WINDOW);
    let [cr, cb] = nl_means_planes(
        [&planes.cr, &planes.cb],
        H_CHROMA,
        TEMPLATE_WINDOW,
        SEARCH_WINDOW,
    );

    ycrcb_to_rgb(&YCrCbPlanes { y, cr, cb })
}

/// Reflect an out-of-range coordinate back into `0..len` without
/// repeating the border sample.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn reflect_101(i: i64, len: i64) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let m = i.rem_euclid(period);
    (if m >= len { period - m } else { m }) as usize
}

/// Jointly denoise `N` planes of equal size.
///
/// Patch distances are averaged across all planes, so every plane in
/// the group shares the same weights.
#[must_use = "returns the denoised planes"]
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn nl_means_planes<const N: usize>(
    planes: [&GrayImage; N],
    h: f64,
    template_window: u32,
    search_window: u32,
) -> [GrayImage; N] {
    let (width, height) = planes.first().map_or((0, 0), |p| p.dimensions());
    if N == 0 || width == 0 || height == 0 || h <= 0.0 {
        return planes.map(Clone::clone);
    }

    let w = i64::from(width);
    let hgt = i64::from(height);
    let tr = i64::from(template_window / 2);
    let sr = i64::from(search_window / 2);
    let n_pixels = (width as usize) * (height as usize);

    let samples: [Vec<f64>; N] =
        planes.map(|p| p.as_raw().iter().map(|&v| f64::from(v)).collect());

    let col: Vec<usize> = (-(tr + sr)..w + tr + sr).map(|x| reflect_101(x, w)).collect();
    let row: Vec<usize> = (-(tr + sr)..hgt + tr + sr)
        .map(|y| reflect_101(y, hgt) * width as usize)
        .collect();
    // Index into `samples` for an image coordinate that may lie outside
    // the image by up to `tr + sr`.
    let at = |x: i64, y: i64| row[(y + tr + sr) as usize] + col[(x + tr + sr) as usize];

    let template_area = ((2 * tr + 1) * (2 * tr + 1)) as f64;
    let scale = 1.0 / (template_area * N as f64 * h * h);

    // Squared differences are summed over the image extended by `tr`
    // on every side so each template lies inside the integral image.
    let ext_w = (w + 2 * tr) as usize;
    let ext_h = (hgt + 2 * tr) as usize;
    let stride = ext_w + 1;
    let mut integral = vec![0.0f64; stride * (ext_h + 1)];

    let mut weighted: [Vec<f64>; N] = std::array::from_fn(|_| vec![0.0; n_pixels]);
    let mut weight_sum = vec![0.0f64; n_pixels];

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            for ey in 0..ext_h {
                let y = ey as i64 - tr;
                let mut running = 0.0;
                for ex in 0..ext_w {
                    let x = ex as i64 - tr;
                    let p = at(x, y);
                    let q = at(x + dx, y + dy);
                    running += samples
                        .iter()
                        .map(|s| {
                            let d = s[p] - s[q];
                            d * d
                        })
                        .sum::<f64>();
                    integral[(ey + 1) * stride + ex + 1] = integral[ey * stride + ex + 1] + running;
                }
            }

            let span = (2 * tr + 1) as usize;
            for y in 0..height as usize {
                for x in 0..width as usize {
                    let (x1, y1) = (x + span, y + span);
                    let ssd = integral[y1 * stride + x1] - integral[y * stride + x1]
                        - integral[y1 * stride + x]
                        + integral[y * stride + x];
                    let weight = (-ssd.max(0.0) * scale).exp();

                    let i = y * width as usize + x;
                    let q = at(x as i64 + dx, y as i64 + dy);
                    weight_sum[i] += weight;
                    for (acc, s) in weighted.iter_mut().zip(&samples) {
                        acc[i] += weight * s[q];
                    }
                }
            }
        }
    }

    std::array::from_fn(|c| {
        let raw = weighted[c]
            .iter()
            .zip(&weight_sum)
            .map(|(&v, &ws)| (v / ws).round().clamp(0.0, 255.0) as u8)
            .collect();
        GrayImage::from_raw(width, height, raw).unwrap_or_else(|| planes[c].clone())
    })
}
