//! Rewriting the deployment descriptor's instance identity

use crate::errors::RunError;
use std::{fs, path::Path};

/// Replace the first occurrence of `pattern` in the file at `path`
///
/// Everything outside the replaced span is left byte-identical. A file
/// without the pattern is left untouched, which is not an error. Returns
/// whether a replacement happened.
pub fn replace_first(path: &Path, pattern: &str, replacement: &str) -> Result<bool, RunError> {
    let contents = fs::read_to_string(path)?;
    match contents.find(pattern) {
        None => Ok(false),
        Some(at) => {
            let mut rewritten = String::with_capacity(contents.len() + replacement.len());
            rewritten.push_str(&contents[..at]);
            rewritten.push_str(replacement);
            rewritten.push_str(&contents[at + pattern.len()..]);
            fs::write(path, rewritten)?;
            Ok(true)
        }
    }
}

/// Rewrite the instance identity the descriptor registers under
///
/// Replaces the first `name: <default_name>` with `name: <instance_name>`.
/// Runs even when the two names are equal, in which case the file content is
/// unchanged.
pub fn rewrite_instance_name(
    path: &Path,
    default_name: &str,
    instance_name: &str,
) -> Result<(), RunError> {
    if !path.is_file() {
        return Err(RunError::DescriptorMissing(path.to_path_buf()));
    }
    let pattern = format!("name: {}", default_name);
    let replacement = format!("name: {}", instance_name);
    if !replace_first(path, &pattern, &replacement)? {
        log::debug!("descriptor {:?} does not name {:?}", path, default_name);
    }
    Ok(())
}
