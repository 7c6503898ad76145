//! Shared types for the rinse denoise pipeline.

use serde::{Deserialize, Serialize};

use crate::filter::DenoiseMethod;

/// Re-export `RgbImage` so downstream crates can reference source and
/// candidate rasters without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for single-plane intermediates (luma/chroma).
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an RGB raster.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One denoised output, labelled by the filter that produced it.
///
/// Has the same dimensions and channel count as the source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Which filter produced this raster.
    pub method: DenoiseMethod,
    /// The denoised raster.
    pub image: RgbImage,
}

/// Result of one pipeline run: every candidate in filter order, one
/// similarity score per candidate, and the index of the best one.
///
/// Produced fresh on every run and never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiseOutcome {
    /// Candidates in the order the filters were applied.
    pub candidates: Vec<Candidate>,
    /// Similarity to the source, parallel to `candidates`.
    pub scores: Vec<f64>,
    /// Index of the highest-scoring candidate (first one on ties).
    pub best_index: usize,
}

impl DenoiseOutcome {
    /// The highest-scoring candidate.
    #[must_use]
    pub fn best(&self) -> &Candidate {
        &self.candidates[self.best_index]
    }

    /// Number of candidates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` if the outcome holds no candidates.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Position of the candidate produced by `method`, if present.
    #[must_use]
    pub fn position(&self, method: DenoiseMethod) -> Option<usize> {
        self.candidates.iter().position(|c| c.method == method)
    }

    /// Candidate and score at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<(&Candidate, f64)> {
        Some((self.candidates.get(index)?, *self.scores.get(index)?))
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty, or the raster has no pixels.
    #[error("input image data is empty")]
    EmptyInput,

    /// The raster is smaller than the similarity window.
    #[error("image is {width}x{height}, smaller than the {min}x{min} similarity window")]
    ImageTooSmall {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Minimum side length.
        min: u32,
    },

    /// Two rasters that must be compared pixel-for-pixel differ in size.
    #[error("cannot compare a {candidate} image against a {reference} reference")]
    SizeMismatch {
        /// Reference dimensions.
        reference: Dimensions,
        /// Candidate dimensions.
        candidate: Dimensions,
    },

    /// The similarity window is not a positive odd size.
    #[error("similarity window must be odd and at least 3, got {0}")]
    InvalidWindow(u32),

    /// A filter returned a raster whose size differs from its input.
    #[error("{method} produced a {actual} image from a {expected} source")]
    DimensionMismatch {
        /// Filter that misbehaved.
        method: DenoiseMethod,
        /// Source dimensions.
        expected: Dimensions,
        /// Candidate dimensions.
        actual: Dimensions,
    },

    /// The pipeline was given no filters to run.
    #[error("no denoise filters were supplied")]
    NoCandidates,

    /// The wavelet round trip could not be completed.
    #[error("wavelet transform failed: {0}")]
    Wavelet(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn outcome() -> DenoiseOutcome {
        let img = RgbImage::new(2, 2);
        DenoiseOutcome {
            candidates: DenoiseMethod::ALL
                .iter()
                .map(|&method| Candidate {
                    method,
                    image: img.clone(),
                })
                .collect(),
            scores: vec![0.5, 0.9, 0.1, 0.9, 0.2],
            best_index: 1,
        }
    }

    #[test]
    fn best_returns_candidate_at_best_index() {
        let o = outcome();
        assert_eq!(o.best().method, DenoiseMethod::MedianBlur);
    }

    #[test]
    fn position_finds_method() {
        let o = outcome();
        assert_eq!(o.position(DenoiseMethod::WaveletTransform), Some(4));
        assert_eq!(o.len(), 5);
        assert!(!o.is_empty());
    }

    #[test]
    fn get_out_of_range_is_none() {
        let o = outcome();
        assert!(o.get(5).is_none());
        let (c, s) = o.get(3).unwrap();
        assert_eq!(c.method, DenoiseMethod::NonLocalMeans);
        assert!((s - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn dimensions_display_and_count() {
        let d = Dimensions {
            width: 64,
            height: 48,
        };
        assert_eq!(d.to_string(), "64x48");
        assert_eq!(d.pixel_count(), 3072);
    }

    #[test]
    fn error_display_messages() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty"
        );
        let err = PipelineError::ImageTooSmall {
            width: 5,
            height: 9,
            min: 7,
        };
        assert_eq!(
            err.to_string(),
            "image is 5x9, smaller than the 7x7 similarity window"
        );
        let err = PipelineError::DimensionMismatch {
            method: DenoiseMethod::WaveletTransform,
            expected: Dimensions {
                width: 9,
                height: 9,
            },
            actual: Dimensions {
                width: 10,
                height: 10,
            },
        };
        assert_eq!(
            err.to_string(),
            "Wavelet Transform produced a 10x10 image from a 9x9 source"
        );
    }

    #[test]
    fn dimensions_serde_round_trip() {
        let d = Dimensions {
            width: 640,
            height: 480,
        };
        let json = serde_json::to_string(&d).unwrap();
        let back: Dimensions = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
