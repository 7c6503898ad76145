//! rinse: denoise an image five ways and keep the best result.
//!
//! Loads a noisy image, runs Gaussian, median, bilateral, non-local means
//! and wavelet denoising over it, ranks the candidates by SSIM against the
//! input, and prints the ranking. The automatic pick can be overridden
//! with `--select` and exported with `--output`.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin rinse -- [OPTIONS] <INPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use rinse_io::Session;
use rinse_pipeline::{Clock, DenoiseMethod};

/// Denoise an image with five classical filters and export the best one.
///
/// Every filter is applied to the input, each result is scored by
/// structural similarity to the input, and the highest score is selected.
#[derive(Parser)]
#[command(name = "rinse", version)]
struct Cli {
    /// Path to the noisy input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Override the automatic selection.
    #[arg(long, value_enum)]
    select: Option<Method>,

    /// Export the selected candidate as PNG to this path.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Write every candidate as `denoised_{i}.png` into this directory.
    #[arg(long)]
    candidates_dir: Option<PathBuf>,

    /// Write the contact sheet and comparison previews into this directory.
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

/// Denoise method selection.
#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// 5x5 Gaussian blur.
    Gaussian,
    /// 5x5 median blur.
    Median,
    /// Bilateral filter.
    Bilateral,
    /// Non-local means.
    NlMeans,
    /// Haar wavelet soft-thresholding.
    Wavelet,
}

impl From<Method> for DenoiseMethod {
    fn from(m: Method) -> Self {
        match m {
            Method::Gaussian => Self::GaussianBlur,
            Method::Median => Self::MedianBlur,
            Method::Bilateral => Self::BilateralFilter,
            Method::NlMeans => Self::NonLocalMeans,
            Method::Wavelet => Self::WaveletTransform,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new();
    session.load(&cli.input)?;
    if let Some(source) = session.source() {
        eprintln!(
            "Image: {} ({}x{})",
            cli.input.display(),
            source.width(),
            source.height(),
        );
    }

    let diagnostics = session.denoise_with_diagnostics(&StdClock)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        println!("{}", diagnostics.report());
    }

    if let Some(method) = cli.select {
        session.select(method.into())?;
    }
    if let (Some(index), Some(outcome)) = (session.selection(), session.outcome())
        && let Some((candidate, score)) = outcome.get(index)
    {
        eprintln!("Selected: {} (SSIM {score:.4})", candidate.method);
    }

    if let Some(ref dir) = cli.candidates_dir
        && let Some(outcome) = session.outcome()
    {
        let paths = rinse_io::write_candidates(dir, outcome)?;
        eprintln!("Wrote {} candidates to {}", paths.len(), dir.display());
    }

    if let Some(ref dir) = cli.preview_dir {
        for path in rinse_io::write_previews(dir, &session)? {
            eprintln!("Preview written to {}", path.display());
        }
    }

    if let Some(ref output) = cli.output {
        session.export(output)?;
        eprintln!("Exported to {}", output.display());
    }

    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn method_names_map_to_pipeline_order() {
        let names: Vec<String> = Method::value_variants()
            .iter()
            .filter_map(ValueEnum::to_possible_value)
            .map(|v| v.get_name().to_owned())
            .collect();
        assert_eq!(names, ["gaussian", "median", "bilateral", "nl-means", "wavelet"]);

        let methods: Vec<DenoiseMethod> = Method::value_variants()
            .iter()
            .map(|&m| m.into())
            .collect();
        assert_eq!(methods, DenoiseMethod::ALL);
    }

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "rinse",
            "in.jpg",
            "--select",
            "nl-means",
            "-o",
            "out.png",
            "--candidates-dir",
            "cands",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("in.jpg"));
        assert!(matches!(cli.select, Some(Method::NlMeans)));
        assert_eq!(cli.output, Some(PathBuf::from("out.png")));
        assert_eq!(cli.candidates_dir, Some(PathBuf::from("cands")));
        assert!(cli.preview_dir.is_none());
        assert!(cli.json);
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!(Cli::try_parse_from(["rinse", "in.png", "--select", "sharpen"]).is_err());
    }
}
