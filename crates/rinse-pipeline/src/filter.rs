//! Denoising filters: the closed set of methods and the capability
//! trait every backend implements.
//!
//! # Strategy pattern
//!
//! [`DenoiseFilter`] is the seam between the selection logic and the
//! filtering backends. [`DenoiseMethod`] implements it with the fixed
//! parameterisation the pipeline ships with; an alternate backend (for
//! example a different wavelet implementation) can implement the trait
//! and report the method it stands in for, leaving ranking untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{PipelineError, RgbImage};

/// The denoising methods, in the order the pipeline applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenoiseMethod {
    /// 5x5 Gaussian blur.
    GaussianBlur,
    /// Median blur with a 5x5 aperture.
    MedianBlur,
    /// Edge-preserving bilateral filter.
    BilateralFilter,
    /// Non-local means over luma and chroma planes.
    NonLocalMeans,
    /// Haar soft-thresholding of the luma plane.
    WaveletTransform,
}

impl DenoiseMethod {
    /// Every method, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::GaussianBlur,
        Self::MedianBlur,
        Self::BilateralFilter,
        Self::NonLocalMeans,
        Self::WaveletTransform,
    ];

    /// Human-readable label shown next to the candidate.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GaussianBlur => "Gaussian Blur",
            Self::MedianBlur => "Median Blur",
            Self::BilateralFilter => "Bilateral Filter",
            Self::NonLocalMeans => "Non-local Means",
            Self::WaveletTransform => "Wavelet Transform",
        }
    }

    /// Zero-based position in [`ALL`](Self::ALL).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DenoiseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A denoising backend: one raster in, one raster of the same size out.
pub trait DenoiseFilter {
    /// The method this filter produces candidates for.
    fn method(&self) -> DenoiseMethod;

    /// Denoise `source`. Must not modify or chain on other candidates.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] if the backend cannot process the
    /// raster.
    fn apply(&self, source: &RgbImage) -> Result<RgbImage, PipelineError>;
}

impl<T: DenoiseFilter + ?Sized> DenoiseFilter for &T {
    fn method(&self) -> DenoiseMethod {
        (**self).method()
    }

    fn apply(&self, source: &RgbImage) -> Result<RgbImage, PipelineError> {
        (**self).apply(source)
    }
}

impl DenoiseFilter for DenoiseMethod {
    fn method(&self) -> DenoiseMethod {
        *self
    }

    fn apply(&self, source: &RgbImage) -> Result<RgbImage, PipelineError> {
        match *self {
            Self::GaussianBlur => Ok(crate::gaussian::gaussian_blur_5x5(source)),
            Self::MedianBlur => Ok(crate::median::median_blur(source)),
            Self::BilateralFilter => Ok(crate::bilateral::bilateral(source)),
            Self::NonLocalMeans => Ok(crate::nl_means::nl_means_colored(source)),
            Self::WaveletTransform => crate::wavelet::wavelet_denoise(source),
        }
    }
}
