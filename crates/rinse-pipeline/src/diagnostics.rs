//! Pipeline diagnostics: per-filter timing and scores for a single run.
//!
//! Every call to [`run_with_diagnostics`](crate::run_with_diagnostics)
//! collects a [`PipelineDiagnostics`] record alongside the outcome.
//!
//! The pipeline never reads the system clock itself. Callers pass a
//! [`Clock`], which keeps this crate free of platform time sources; the
//! `rinse` binary supplies one backed by [`std::time::Instant`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::filter::DenoiseMethod;

/// Source of timestamps for diagnostics.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// One entry per candidate, in filter order.
    pub candidates: Vec<CandidateDiagnostics>,
    /// Index of the selected candidate.
    pub best_index: usize,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Timing and score for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDiagnostics {
    /// Filter that produced the candidate.
    pub method: DenoiseMethod,
    /// Time spent filtering (seconds).
    #[serde(with = "duration_serde")]
    pub filter_duration: Duration,
    /// Time spent scoring (seconds).
    #[serde(with = "duration_serde")]
    pub score_duration: Duration,
    /// Similarity to the source.
    pub score: f64,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Denoise Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.image_width,
            self.image_height,
            u64::from(self.image_width) * u64::from(self.image_height),
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<4}{:<20} {:>10} {:>10} {:>10} {:>9}",
            "", "Method", "Filter", "Scoring", "% Total", "SSIM"
        ));
        lines.push("-".repeat(68));

        let total_ms = duration_ms(self.total_duration);
        for (i, c) in self.candidates.iter().enumerate() {
            let filter_ms = duration_ms(c.filter_duration);
            let score_ms = duration_ms(c.score_duration);
            let pct = if total_ms > 0.0 {
                (filter_ms + score_ms) / total_ms * 100.0
            } else {
                0.0
            };
            let marker = if i == self.best_index { " *" } else { "" };
            lines.push(format!(
                "{i:<4}{:<20} {filter_ms:>8.3}ms {score_ms:>8.3}ms {pct:>9.1}% {:>9.4}{marker}",
                c.method.label(),
                c.score,
            ));
        }

        if let Some(best) = self.candidates.get(self.best_index) {
            lines.push(String::new());
            lines.push(format!(
                "Best: {} (SSIM {:.4})",
                best.method.label(),
                best.score
            ));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
