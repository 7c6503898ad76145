//! 8-bit RGB <-> YCrCb conversion.
//!
//! Uses the BT.601 luma weights with chroma offset by 128, stored as
//! three separate planes. The wavelet and non-local-means filters work
//! on these planes so luma and chroma can be treated differently.

use crate::types::{GrayImage, RgbImage};

/// Luma weight for red.
const KR: f32 = 0.299;
/// Luma weight for green.
const KG: f32 = 0.587;
/// Luma weight for blue.
const KB: f32 = 0.114;
/// Scale from `R - Y` to Cr.
const CR_SCALE: f32 = 0.713;
/// Scale from `B - Y` to Cb.
const CB_SCALE: f32 = 0.564;
/// Chroma offset for 8-bit storage.
const CHROMA_OFFSET: f32 = 128.0;

/// A raster split into luma and chroma planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YCrCbPlanes {
    /// Luma.
    pub y: GrayImage,
    /// Red-difference chroma.
    pub cr: GrayImage,
    /// Blue-difference chroma.
    pub cb: GrayImage,
}

/// Round and saturate to `u8`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn saturate_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Convert an RGB raster to YCrCb planes.
#[must_use = "returns the converted planes"]
pub fn rgb_to_ycrcb(image: &RgbImage) -> YCrCbPlanes {
    let (w, h) = image.dimensions();
    let mut y = GrayImage::new(w, h);
    let mut cr = GrayImage::new(w, h);
    let mut cb = GrayImage::new(w, h);

    for (px, py, p) in image.enumerate_pixels() {
        let [r, g, b] = p.0.map(f32::from);
        let luma = saturate_u8(KR.mul_add(r, KG.mul_add(g, KB * b)));
        let yf = f32::from(luma);
        y.put_pixel(px, py, image::Luma([luma]));
        cr.put_pixel(
            px,
            py,
            image::Luma([saturate_u8((r - yf).mul_add(CR_SCALE, CHROMA_OFFSET))]),
        );
        cb.put_pixel(
            px,
            py,
            image::Luma([saturate_u8((b - yf).mul_add(CB_SCALE, CHROMA_OFFSET))]),
        );
    }

    YCrCbPlanes { y, cr, cb }
}

/// Convert YCrCb planes back to an RGB raster.
///
/// All three planes must share the same dimensions; the luma plane's
/// size is used for the output.
#[must_use = "returns the converted RGB image"]
pub fn ycrcb_to_rgb(planes: &YCrCbPlanes) -> RgbImage {
    let (w, h) = planes.y.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let yf = f32::from(planes.y.get_pixel(x, y).0[0]);
        let dr = f32::from(planes.cr.get_pixel(x, y).0[0]) - CHROMA_OFFSET;
        let db = f32::from(planes.cb.get_pixel(x, y).0[0]) - CHROMA_OFFSET;
        image::Rgb([
            saturate_u8(1.403f32.mul_add(dr, yf)),
            saturate_u8((-0.344f32).mul_add(db, (-0.714f32).mul_add(dr, yf))),
            saturate_u8(1.773f32.mul_add(db, yf)),
        ])
    })
}
