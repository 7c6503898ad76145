//! Filesystem output: candidate files, preview images, and atomic writes.

use std::io;
use std::path::{Path, PathBuf};

use rinse_pipeline::DenoiseOutcome;

use crate::session::{Session, SessionError};

/// File name of the contact sheet written by [`write_previews`].
pub const CONTACT_SHEET_FILE: &str = "contact-sheet.png";

/// File name of the comparison view written by [`write_previews`].
pub const COMPARISON_FILE: &str = "comparison.png";

/// File name for the candidate at `index`.
#[must_use]
pub fn candidate_file_name(index: usize) -> String {
    format!("denoised_{index}.png")
}

/// Write `bytes` to a temporary sibling of `dest`, then rename it over
/// `dest`.
///
/// The temporary file is removed if either the write or the rename
/// fails.
///
/// # Errors
///
/// Returns any I/O error from writing or renaming.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temp_sibling(dest)?;
    let result = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, dest));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// Write every candidate of `outcome` into `dir` as `denoised_{i}.png`,
/// creating `dir` if needed. Returns the written paths in candidate
/// order.
///
/// # Errors
///
/// Returns [`SessionError::ExportFailure`] if the directory cannot be
/// created or a file cannot be encoded or written.
pub fn write_candidates(dir: &Path, outcome: &DenoiseOutcome) -> Result<Vec<PathBuf>, SessionError> {
    create_dir(dir)?;
    outcome
        .candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let path = dir.join(candidate_file_name(i));
            let bytes = rinse_export::encode_png(&candidate.image)
                .map_err(|e| SessionError::ExportFailure(e.to_string()))?;
            write_atomic(&path, &bytes).map_err(|e| export_failure(&path, &e))?;
            Ok(path)
        })
        .collect()
}

/// Write the contact sheet and the comparison of the selection against
/// the raster it was computed from into `dir`.
///
/// # Errors
///
/// Returns [`SessionError::ExportFailure`] when there is no selection or
/// a file cannot be written.
pub fn write_previews(dir: &Path, session: &Session) -> Result<Vec<PathBuf>, SessionError> {
    let (Some(outcome), Some(scored), Some(selected)) = (
        session.outcome(),
        session.outcome_source(),
        session.selected(),
    ) else {
        return Err(SessionError::ExportFailure(
            "no denoised image is selected".into(),
        ));
    };

    create_dir(dir)?;

    let sheet = rinse_export::contact_sheet(&outcome.candidates, session.selection());
    let sheet_png = rinse_export::encode_png_rgba(&sheet)
        .map_err(|e| SessionError::ExportFailure(e.to_string()))?;
    let sheet_path = dir.join(CONTACT_SHEET_FILE);
    write_atomic(&sheet_path, &sheet_png).map_err(|e| export_failure(&sheet_path, &e))?;

    let view = rinse_export::side_by_side(scored, &selected.image);
    let view_png =
        rinse_export::encode_png(&view).map_err(|e| SessionError::ExportFailure(e.to_string()))?;
    let view_path = dir.join(COMPARISON_FILE);
    write_atomic(&view_path, &view_png).map_err(|e| export_failure(&view_path, &e))?;

    Ok(vec![sheet_path, view_path])
}

fn create_dir(dir: &Path) -> Result<(), SessionError> {
    std::fs::create_dir_all(dir).map_err(|e| export_failure(dir, &e))
}

fn export_failure(path: &Path, err: &io::Error) -> SessionError {
    SessionError::ExportFailure(format!("{}: {err}", path.display()))
}

/// `.<name>.tmp` next to `dest`.
fn temp_sibling(dest: &Path) -> io::Result<PathBuf> {
    let name = dest.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination has no file name",
        )
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(".tmp");
    Ok(dest.with_file_name(tmp_name))
}
