//! Image decoding to a 3-channel raster.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the
//! 8-bit RGB raster every filter consumes. Alpha is discarded and
//! grayscale sources are expanded to three equal channels.

use crate::types::{PipelineError, RgbImage};

/// Smallest side length the pipeline accepts.
///
/// The similarity metric evaluates 7x7 windows and cannot score a
/// raster smaller than one window.
pub const MIN_SIDE: u32 = crate::similarity::DEFAULT_WINDOW;

/// Decode raw image bytes into an RGB raster.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Check that a raster can go through the pipeline.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] for a zero-sized raster and
/// [`PipelineError::ImageTooSmall`] when either side is below
/// [`MIN_SIDE`].
pub fn validate_source(image: &RgbImage) -> Result<(), PipelineError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::EmptyInput);
    }
    if width < MIN_SIDE || height < MIN_SIDE {
        return Err(PipelineError::ImageTooSmall {
            width,
            height,
            min: MIN_SIDE,
        });
    }
    Ok(())
}
