//! Session state: the loaded source, the latest outcome, and the current
//! selection.
//!
//! A [`Session`] replaces the ambient state an interactive shell would
//! otherwise carry. It enforces the ordering rules between operations:
//!
//! - [`Session::denoise`] needs a loaded source.
//! - A successful run replaces the outcome and resets the selection to
//!   the best candidate. A failed run leaves both untouched.
//! - Loading a new source keeps the previous outcome until the next
//!   successful run. The outcome remembers the raster it came from.
//! - [`Session::export`] needs a selection and never creates a file
//!   without one.

use std::path::{Path, PathBuf};

use rinse_pipeline::{
    Candidate, Clock, DenoiseMethod, DenoiseOutcome, PipelineDiagnostics, PipelineError, RgbImage,
    Ssim,
};

/// Errors surfaced to the user by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No usable source image: none loaded, unreadable, or undecodable.
    #[error("{0}")]
    InvalidInput(String),

    /// The pipeline failed; no partial results were kept.
    #[error("Denoising failed: {0}")]
    PipelineFailure(#[source] PipelineError),

    /// Nothing to export, or the destination could not be written.
    #[error("Export failed: {0}")]
    ExportFailure(String),

    /// The requested candidate does not exist in the current outcome.
    #[error("no denoised candidate at index {0}")]
    UnknownSelection(usize),
}

/// Message shown when an operation needs a source that is not loaded.
pub const NO_SOURCE_MESSAGE: &str = "please choose an image first";

/// Interactive denoise session.
#[derive(Debug, Default)]
pub struct Session {
    source: Option<RgbImage>,
    source_path: Option<PathBuf>,
    outcome: Option<DenoiseOutcome>,
    outcome_source: Option<RgbImage>,
    selection: Option<usize>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and decode the image at `path` and make it the source.
    ///
    /// Any previous outcome and selection are kept until the next
    /// successful run. On failure the session is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidInput`] if the file cannot be read
    /// or decoded.
    pub fn load(&mut self, path: &Path) -> Result<(), SessionError> {
        let bytes = std::fs::read(path).map_err(|e| {
            SessionError::InvalidInput(format!("cannot read {}: {e}", path.display()))
        })?;
        let image = rinse_pipeline::decode_rgb(&bytes).map_err(|e| {
            SessionError::InvalidInput(format!("cannot decode {}: {e}", path.display()))
        })?;

        self.set_source(image);
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Use an in-memory raster as the source.
    ///
    /// The previous outcome and selection stay until the next successful
    /// run.
    pub fn set_source(&mut self, image: RgbImage) {
        self.source = Some(image);
        self.source_path = None;
    }

    /// The loaded source image.
    #[must_use]
    pub const fn source(&self) -> Option<&RgbImage> {
        self.source.as_ref()
    }

    /// Path the source was loaded from, if it came from a file.
    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// The outcome of the last successful run.
    #[must_use]
    pub const fn outcome(&self) -> Option<&DenoiseOutcome> {
        self.outcome.as_ref()
    }

    /// The raster the current outcome was computed from.
    #[must_use]
    pub const fn outcome_source(&self) -> Option<&RgbImage> {
        self.outcome_source.as_ref()
    }

    /// Whether the outcome was computed from the loaded source.
    #[must_use]
    pub fn is_outcome_current(&self) -> bool {
        matches!(
            (&self.source, &self.outcome_source),
            (Some(source), Some(scored)) if source == scored
        )
    }

    /// Index of the selected candidate.
    #[must_use]
    pub const fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// The selected candidate.
    #[must_use]
    pub fn selected(&self) -> Option<&Candidate> {
        let index = self.selection?;
        self.outcome.as_ref()?.candidates.get(index)
    }

    /// Run the pipeline on the loaded source.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidInput`] with no source loaded and
    /// [`SessionError::PipelineFailure`] if the pipeline fails. In both
    /// cases the previous outcome and selection are kept.
    pub fn denoise(&mut self) -> Result<&DenoiseOutcome, SessionError> {
        let source = self.require_source()?;
        let outcome = rinse_pipeline::run(source).map_err(SessionError::PipelineFailure)?;
        let scored = source.clone();
        Ok(self.accept(outcome, scored))
    }

    /// Run the pipeline and collect diagnostics timed by `clock`.
    ///
    /// # Errors
    ///
    /// Same as [`denoise`](Self::denoise).
    pub fn denoise_with_diagnostics<C: Clock>(
        &mut self,
        clock: &C,
    ) -> Result<PipelineDiagnostics, SessionError> {
        let source = self.require_source()?;
        let (outcome, diagnostics) = rinse_pipeline::run_with_diagnostics(
            source,
            &DenoiseMethod::ALL,
            &Ssim::default(),
            clock,
        )
        .map_err(SessionError::PipelineFailure)?;
        let scored = source.clone();
        self.accept(outcome, scored);
        Ok(diagnostics)
    }

    /// Select the candidate produced by `method`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownSelection`] if there is no outcome
    /// or it holds no candidate for `method`. The selection is unchanged.
    pub fn select(&mut self, method: DenoiseMethod) -> Result<(), SessionError> {
        let index = self
            .outcome
            .as_ref()
            .and_then(|o| o.position(method))
            .ok_or(SessionError::UnknownSelection(method.index()))?;
        self.selection = Some(index);
        Ok(())
    }

    /// Select the candidate at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownSelection`] if `index` is out of
    /// range or there is no outcome. The selection is unchanged.
    pub fn select_index(&mut self, index: usize) -> Result<(), SessionError> {
        match &self.outcome {
            Some(o) if index < o.len() => {
                self.selection = Some(index);
                Ok(())
            }
            _ => Err(SessionError::UnknownSelection(index)),
        }
    }

    /// Write the selected candidate to `dest` as PNG.
    ///
    /// The bytes go to a temporary sibling file that is then renamed over
    /// `dest`, so a failed write never leaves a truncated file behind.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ExportFailure`] if nothing is selected
    /// (no file is created), if encoding fails, or if `dest` cannot be
    /// written.
    pub fn export(&self, dest: &Path) -> Result<(), SessionError> {
        let candidate = self
            .selected()
            .ok_or_else(|| SessionError::ExportFailure("no denoised image is selected".into()))?;
        let bytes = rinse_export::encode_png(&candidate.image)
            .map_err(|e| SessionError::ExportFailure(e.to_string()))?;
        crate::files::write_atomic(dest, &bytes)
            .map_err(|e| SessionError::ExportFailure(format!("{}: {e}", dest.display())))
    }

    fn require_source(&self) -> Result<&RgbImage, SessionError> {
        self.source
            .as_ref()
            .ok_or_else(|| SessionError::InvalidInput(NO_SOURCE_MESSAGE.into()))
    }

    fn accept(&mut self, outcome: DenoiseOutcome, scored: RgbImage) -> &DenoiseOutcome {
        self.selection = Some(outcome.best_index);
        self.outcome_source = Some(scored);
        self.outcome.insert(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn textured() -> RgbImage {
        RgbImage::from_fn(16, 12, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 20) as u8, ((x + y) * 7) as u8])
        })
    }

    #[test]
    fn denoise_without_source_is_invalid_input() {
        let mut s = Session::new();
        let err = s.denoise().unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(_)));
        assert_eq!(err.to_string(), "please choose an image first");
    }

    #[test]
    fn denoise_resets_selection_to_best() {
        let mut s = Session::new();
        s.set_source(textured());
        let best = s.denoise().unwrap().best_index;
        assert_eq!(s.selection(), Some(best));
        assert_eq!(s.selected().unwrap().method, DenoiseMethod::ALL[best]);
    }

    #[test]
    fn select_overrides_and_rerun_resets() {
        let mut s = Session::new();
        s.set_source(textured());
        let best = s.denoise().unwrap().best_index;
        let other = DenoiseMethod::ALL[(best + 1) % 5];

        s.select(other).unwrap();
        assert_eq!(s.selected().unwrap().method, other);

        s.denoise().unwrap();
        assert_eq!(s.selection(), Some(best));
    }

    #[test]
    fn select_before_run_is_rejected() {
        let mut s = Session::new();
        assert!(matches!(
            s.select(DenoiseMethod::MedianBlur),
            Err(SessionError::UnknownSelection(1))
        ));
        assert!(s.selection().is_none());
    }

    #[test]
    fn select_index_out_of_range_keeps_selection() {
        let mut s = Session::new();
        s.set_source(textured());
        s.denoise().unwrap();
        let before = s.selection();
        assert!(matches!(
            s.select_index(5),
            Err(SessionError::UnknownSelection(5))
        ));
        assert_eq!(s.selection(), before);
        s.select_index(4).unwrap();
        assert_eq!(s.selection(), Some(4));
    }

    #[test]
    fn failed_run_keeps_previous_outcome() {
        let mut s = Session::new();
        s.set_source(textured());
        s.denoise().unwrap();
        s.select(DenoiseMethod::WaveletTransform).unwrap();
        let before = s.outcome().cloned();

        s.set_source(RgbImage::new(3, 3));
        let err = s.denoise().unwrap_err();
        assert!(matches!(
            err,
            SessionError::PipelineFailure(PipelineError::ImageTooSmall { .. })
        ));
        assert!(err.to_string().starts_with("Denoising failed: "));
        assert_eq!(s.outcome().cloned(), before);
        assert_eq!(s.selection(), Some(4));
        assert_eq!(s.outcome_source(), Some(&textured()));
        assert!(!s.is_outcome_current());
    }

    #[test]
    fn new_source_keeps_results_until_next_run() {
        let mut s = Session::new();
        s.set_source(textured());
        s.denoise().unwrap();
        s.select(DenoiseMethod::MedianBlur).unwrap();
        assert!(s.is_outcome_current());

        let other = RgbImage::from_pixel(10, 10, image::Rgb([40, 80, 120]));
        s.set_source(other.clone());
        assert!(!s.is_outcome_current());
        assert_eq!(s.outcome_source(), Some(&textured()));
        assert_eq!(s.selected().unwrap().method, DenoiseMethod::MedianBlur);

        s.denoise().unwrap();
        assert!(s.is_outcome_current());
        assert_eq!(s.outcome_source(), Some(&other));
        assert_eq!(s.outcome().unwrap().candidates[0].image.dimensions(), (10, 10));
    }

    #[test]
    fn fresh_session_has_no_outcome_source() {
        let mut s = Session::new();
        assert!(s.outcome_source().is_none());
        s.set_source(textured());
        assert!(!s.is_outcome_current());
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            SessionError::ExportFailure("disk full".into()).to_string(),
            "Export failed: disk full"
        );
        assert_eq!(
            SessionError::UnknownSelection(7).to_string(),
            "no denoised candidate at index 7"
        );
    }
}
