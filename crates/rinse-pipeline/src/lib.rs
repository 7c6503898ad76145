//! rinse-pipeline: Pure multi-method denoise pipeline (sans-IO).
//!
//! Runs five classical denoising filters over a color image, scores each
//! result against the source with windowed SSIM, and picks the
//! highest-scoring one:
//!
//! Gaussian blur, median blur, bilateral filter, non-local means,
//! Haar wavelet soft-thresholding -> SSIM -> stable argmax.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! rasters and byte slices and returns structured data. Filesystem
//! interaction lives in `rinse-io`.

pub mod bilateral;
pub mod color;
pub mod decode;
pub mod diagnostics;
pub mod filter;
pub mod gaussian;
pub mod median;
pub mod nl_means;
pub mod select;
pub mod similarity;
pub mod types;
pub mod wavelet;

use std::time::Duration;

pub use decode::{decode_rgb, validate_source};
pub use diagnostics::{CandidateDiagnostics, Clock, PipelineDiagnostics};
pub use filter::{DenoiseFilter, DenoiseMethod};
pub use select::select_best;
pub use similarity::{SimilarityScorer, Ssim};
pub use types::{Candidate, DenoiseOutcome, Dimensions, GrayImage, PipelineError, RgbImage};

/// Run the full denoise pipeline with the shipped filters and SSIM.
///
/// Equivalent to [`run_with`] over [`DenoiseMethod::ALL`] and
/// [`Ssim::default`].
///
/// # Pipeline steps
///
/// 1. Validate the source (non-empty, at least the SSIM window in size)
/// 2. Apply every filter to the source, in order
/// 3. Score every candidate against the source
/// 4. Select the highest score (first one on ties)
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] for a raster with no pixels,
/// [`PipelineError::ImageTooSmall`] if either side is below the SSIM
/// window, and any error raised by a filter or by scoring. No partial
/// outcome is returned.
pub fn run(source: &RgbImage) -> Result<DenoiseOutcome, PipelineError> {
    run_with(source, &DenoiseMethod::ALL, &Ssim::default())
}

/// Run the pipeline over caller-supplied filters and scorer.
///
/// Filters are applied to the source independently, never chained.
///
/// # Errors
///
/// As [`run`], plus [`PipelineError::NoCandidates`] when `filters` is
/// empty and [`PipelineError::DimensionMismatch`] when a filter returns
/// a raster of a different size.
pub fn run_with<F, S>(
    source: &RgbImage,
    filters: &[F],
    scorer: &S,
) -> Result<DenoiseOutcome, PipelineError>
where
    F: DenoiseFilter,
    S: SimilarityScorer + ?Sized,
{
    run_with_diagnostics(source, filters, scorer, &NoClock).map(|(outcome, _)| outcome)
}

/// Run the pipeline and collect per-filter timing and scores.
///
/// Timing comes from `clock`; the pipeline never reads the system clock
/// itself.
///
/// # Errors
///
/// Same as [`run_with`].
pub fn run_with_diagnostics<F, S, C>(
    source: &RgbImage,
    filters: &[F],
    scorer: &S,
    clock: &C,
) -> Result<(DenoiseOutcome, PipelineDiagnostics), PipelineError>
where
    F: DenoiseFilter,
    S: SimilarityScorer + ?Sized,
    C: Clock,
{
    let start = clock.now();

    validate_source(source)?;
    if filters.is_empty() {
        return Err(PipelineError::NoCandidates);
    }
    let expected = Dimensions::of(source);

    let mut candidates = Vec::with_capacity(filters.len());
    let mut scores = Vec::with_capacity(filters.len());
    let mut timings = Vec::with_capacity(filters.len());

    for filter in filters {
        let method = filter.method();

        let t = clock.now();
        let image = filter.apply(source)?;
        let filter_duration = clock.elapsed(&t);

        let actual = Dimensions::of(&image);
        if actual != expected {
            return Err(PipelineError::DimensionMismatch {
                method,
                expected,
                actual,
            });
        }

        let t = clock.now();
        let score = scorer.score(source, &image)?;
        let score_duration = clock.elapsed(&t);

        candidates.push(Candidate { method, image });
        scores.push(score);
        timings.push(CandidateDiagnostics {
            method,
            filter_duration,
            score_duration,
            score,
        });
    }

    let best_index = select_best(&scores).ok_or(PipelineError::NoCandidates)?;

    let diagnostics = PipelineDiagnostics {
        image_width: expected.width,
        image_height: expected.height,
        candidates: timings,
        best_index,
        total_duration: clock.elapsed(&start),
    };

    Ok((
        DenoiseOutcome {
            candidates,
            scores,
            best_index,
        },
        diagnostics,
    ))
}

/// Clock used when the caller does not want timing.
struct NoClock;

impl Clock for NoClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _since: &()) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn textured(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([
                ((x * 37 + y * 11) % 256) as u8,
                ((x * 5 + y * 29) % 256) as u8,
                (((x ^ y) * 13) % 256) as u8,
            ])
        })
    }

    /// Filter that returns the source unchanged but reports another method.
    struct Identity(DenoiseMethod);

    impl DenoiseFilter for Identity {
        fn method(&self) -> DenoiseMethod {
            self.0
        }

        fn apply(&self, source: &RgbImage) -> Result<RgbImage, PipelineError> {
            Ok(source.clone())
        }
    }

    /// Filter that returns a raster one pixel wider than the source.
    struct Grows;

    impl DenoiseFilter for Grows {
        fn method(&self) -> DenoiseMethod {
            DenoiseMethod::WaveletTransform
        }

        fn apply(&self, source: &RgbImage) -> Result<RgbImage, PipelineError> {
            Ok(RgbImage::new(source.width() + 1, source.height()))
        }
    }

    /// Filter that always fails.
    struct Broken;

    impl DenoiseFilter for Broken {
        fn method(&self) -> DenoiseMethod {
            DenoiseMethod::WaveletTransform
        }

        fn apply(&self, _source: &RgbImage) -> Result<RgbImage, PipelineError> {
            Err(PipelineError::Wavelet("broken".into()))
        }
    }

    /// Scorer returning a fixed sequence of scores.
    struct Scripted {
        scores: Vec<f64>,
        next: Cell<usize>,
    }

    impl Scripted {
        fn new(scores: &[f64]) -> Self {
            Self {
                scores: scores.to_vec(),
                next: Cell::new(0),
            }
        }
    }

    impl SimilarityScorer for Scripted {
        fn score(&self, _: &RgbImage, _: &RgbImage) -> Result<f64, PipelineError> {
            let i = self.next.get();
            self.next.set(i + 1);
            Ok(self.scores[i])
        }
    }

    /// Clock that advances one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.0.get() - since)
        }
    }

    #[test]
    fn five_candidates_in_fixed_order() {
        let img = textured(24, 20);
        let outcome = run(&img).unwrap();
        assert_eq!(outcome.len(), 5);
        assert_eq!(outcome.scores.len(), 5);
        let methods: Vec<DenoiseMethod> = outcome.candidates.iter().map(|c| c.method).collect();
        assert_eq!(methods, DenoiseMethod::ALL);
        for c in &outcome.candidates {
            assert_eq!(c.image.dimensions(), (24, 20));
        }
        assert!(outcome.best_index < 5);
    }

    #[test]
    fn best_index_holds_maximum_score() {
        let outcome = run(&textured(16, 16)).unwrap();
        let best = outcome.scores[outcome.best_index];
        for (i, &s) in outcome.scores.iter().enumerate() {
            assert!(s <= best, "score {i} = {s} beats best {best}");
            if i < outcome.best_index {
                assert!(s < best, "earlier tie at {i} should have won");
            }
        }
    }

    #[test]
    fn black_image_selects_first_with_perfect_scores() {
        let img = RgbImage::new(64, 64);
        let outcome = run(&img).unwrap();
        assert_eq!(outcome.best_index, 0);
        for (c, &s) in outcome.candidates.iter().zip(&outcome.scores) {
            assert_eq!(c.image, img, "{} changed a black image", c.method);
            assert!((s - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn source_is_not_modified() {
        let img = textured(12, 12);
        let copy = img.clone();
        let _ = run(&img).unwrap();
        assert_eq!(img, copy);
    }

    #[test]
    fn too_small_source_fails() {
        let img = RgbImage::new(6, 6);
        assert!(matches!(
            run(&img),
            Err(PipelineError::ImageTooSmall { width: 6, height: 6, min: 7 })
        ));
    }

    #[test]
    fn tie_resolves_to_first() {
        let img = textured(10, 10);
        let filters: Vec<Identity> = DenoiseMethod::ALL.iter().map(|&m| Identity(m)).collect();
        let scorer = Scripted::new(&[0.7, 0.9, 0.9, 0.1, 0.9]);
        let outcome = run_with(&img, &filters, &scorer).unwrap();
        assert_eq!(outcome.best_index, 1);
        assert_eq!(outcome.best().method, DenoiseMethod::MedianBlur);
    }

    #[test]
    fn mixed_backends_through_trait_objects() {
        let img = textured(10, 10);
        let swapped = Identity(DenoiseMethod::WaveletTransform);
        let filters: [&dyn DenoiseFilter; 2] = [&DenoiseMethod::GaussianBlur, &swapped];
        let outcome = run_with(&img, &filters, &Ssim::default()).unwrap();
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.candidates[1].method, DenoiseMethod::WaveletTransform);
        // The identity candidate matches the source exactly.
        assert_eq!(outcome.best_index, 1);
    }

    #[test]
    fn wrong_size_candidate_fails_whole_run() {
        let img = textured(10, 10);
        let filters: [&dyn DenoiseFilter; 2] = [&DenoiseMethod::MedianBlur, &Grows];
        let err = run_with(&img, &filters, &Ssim::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DimensionMismatch {
                method: DenoiseMethod::WaveletTransform,
                ..
            }
        ));
    }

    #[test]
    fn filter_error_fails_whole_run() {
        let img = textured(10, 10);
        let filters: [&dyn DenoiseFilter; 2] = [&DenoiseMethod::MedianBlur, &Broken];
        assert!(matches!(
            run_with(&img, &filters, &Ssim::default()),
            Err(PipelineError::Wavelet(_))
        ));
    }

    #[test]
    fn no_filters_is_an_error() {
        let img = textured(10, 10);
        let filters: [DenoiseMethod; 0] = [];
        assert!(matches!(
            run_with(&img, &filters, &Ssim::default()),
            Err(PipelineError::NoCandidates)
        ));
    }

    #[test]
    fn diagnostics_track_each_candidate() {
        let img = textured(10, 10);
        let filters: Vec<Identity> = DenoiseMethod::ALL.iter().map(|&m| Identity(m)).collect();
        let scorer = Scripted::new(&[0.1, 0.2, 0.3, 0.5, 0.4]);
        let clock = TickClock(Cell::new(0));
        let (outcome, diag) = run_with_diagnostics(&img, &filters, &scorer, &clock).unwrap();

        assert_eq!(outcome.best_index, 3);
        assert_eq!(diag.best_index, 3);
        assert_eq!((diag.image_width, diag.image_height), (10, 10));
        assert_eq!(diag.candidates.len(), 5);
        for (d, (c, &s)) in diag
            .candidates
            .iter()
            .zip(outcome.candidates.iter().zip(&outcome.scores))
        {
            assert_eq!(d.method, c.method);
            assert!((d.score - s).abs() < f64::EPSILON);
            assert!(d.filter_duration > Duration::ZERO);
            assert!(d.score_duration > Duration::ZERO);
        }
        assert!(diag.total_duration >= Duration::from_millis(10));
    }
}
