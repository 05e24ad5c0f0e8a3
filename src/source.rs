//! Locating the bundle's source file and its optional run entry point

use crate::errors::RunError;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// File extension of the bundle's language source
pub static SOURCE_FILE_EXT: &str = "bal";

static RUN_MARKER: &str = "function run(";

/// Locate the single source file expected inside the extracted bundle
///
/// Exactly one source file must be present; none or several are errors.
pub fn find_source_file(source_dir: &Path) -> Result<PathBuf, RunError> {
    let mut found = None;
    for entry in fs::read_dir(source_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_FILE_EXT) {
            if found.is_some() {
                return Err(RunError::SourceFileAmbiguous(source_dir.to_path_buf()));
            }
            found = Some(path);
        }
    }
    found.ok_or_else(|| RunError::SourceFileMissing(source_dir.to_path_buf()))
}

/// Check whether the source declares a run entry point
///
/// Read-only scan for the run procedure marker.
pub fn has_run_entry_point(source_file: &Path) -> Result<bool, RunError> {
    let contents = fs::read_to_string(source_file)?;
    Ok(contents.contains(RUN_MARKER))
}
