// src/process/extract.rs
use std::{
    env,
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use super::{
    csv_reader::read_csv_file,
    utils::{AUDITOR_REPORT_PREFIX, CSV_EXTENSION, MACOS_METADATA_DIR},
    RawCsv, RawRecordSet,
};
use crate::error::ExtractError;

/// Unpack `zip_path` into a scratch directory under the system temp dir
/// and read every usable tabular export.
pub fn extract_archive(zip_path: &Path) -> Result<RawRecordSet, ExtractError> {
    extract_archive_in(zip_path, &env::temp_dir())
}

/// Like [`extract_archive`], with the scratch directory created under
/// `scratch_root`. The scratch directory is closed before returning,
/// whatever the outcome.
#[instrument(level = "debug", skip(zip_path, scratch_root), fields(zip = %zip_path.display()))]
pub fn extract_archive_in(
    zip_path: &Path,
    scratch_root: &Path,
) -> Result<RawRecordSet, ExtractError> {
    let scratch = tempfile::Builder::new()
        .prefix("edinet-")
        .tempdir_in(scratch_root)
        .map_err(|e| bad_archive(zip_path, format!("creating scratch dir: {}", e)))?;

    let outcome =
        unpack(zip_path, scratch.path()).and_then(|()| read_exports(zip_path, scratch.path()));

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!(dir = %scratch_path.display(), error = %e, "failed to remove scratch dir");
    }
    outcome
}

fn bad_archive(zip_path: &Path, reason: String) -> ExtractError {
    ExtractError::BadArchive {
        path: zip_path.display().to_string(),
        reason,
    }
}

fn unpack(zip_path: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(zip_path).map_err(|e| bad_archive(zip_path, e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| bad_archive(zip_path, e.to_string()))?;
    archive
        .extract(dest)
        .map_err(|e| bad_archive(zip_path, e.to_string()))?;
    debug!(entries = archive.len(), dest = %dest.display(), "extracted");
    Ok(())
}

/// Tabular exports under `root`, skipping macOS metadata directories and
/// auditor reports. Sorted by path so traversal order is stable.
fn candidate_exports(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == MACOS_METADATA_DIR))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            if !name.to_lowercase().ends_with(CSV_EXTENSION) {
                return false;
            }
            if name.starts_with(AUDITOR_REPORT_PREFIX) {
                debug!(file = %name, "skipping auditor report");
                return false;
            }
            true
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn read_exports(zip_path: &Path, root: &Path) -> Result<RawRecordSet, ExtractError> {
    let mut raw = RawRecordSet::new();
    for path in candidate_exports(root) {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match read_csv_file(&path) {
            Ok(records) => raw.push(RawCsv { filename, records }),
            Err(e) => warn!(file = %filename, error = %e, "skipping unreadable export"),
        }
    }

    if raw.is_empty() {
        warn!(zip = %zip_path.display(), "no valid data extracted from archive");
        return Err(ExtractError::NoUsableData {
            path: zip_path.display().to_string(),
        });
    }
    Ok(raw)
}
