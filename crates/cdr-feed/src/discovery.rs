//! Daily file discovery and archiving

use cdr_core::{AppError, AppResult};
use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Placeholder replaced by the feed date in file patterns
pub const DATE_PLACEHOLDER: &str = "{date}";

/// File name for `date`, with `{date}` rendered as `YYYYMMDD`
pub fn file_name_for(pattern: &str, date: NaiveDate) -> String {
    pattern.replace(DATE_PLACEHOLDER, &date.format("%Y%m%d").to_string())
}

/// Anchored regex for a file name; `*` matches any run of characters
fn name_matcher(name: &str) -> AppResult<Regex> {
    let body = name
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("^{}$", body))
        .map_err(|e| AppError::Config(format!("Invalid file pattern {:?}: {}", name, e)))
}

/// List the files in `dir` whose name matches `pattern` for `date`
///
/// Results are sorted by name. A missing directory is an error; a directory
/// with no matching files is not.
pub fn discover_files(dir: &Path, pattern: &str, date: NaiveDate) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::InputDirNotFound(dir.display().to_string()));
    }

    let name = file_name_for(pattern, date);
    let matcher = name_matcher(&name)?;

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(file_name) = entry.file_name().to_str() {
            if matcher.is_match(file_name) {
                files.push(entry.path());
            }
        }
    }
    files.sort();

    debug!(
        "Found {} file(s) matching {} in {}",
        files.len(),
        name,
        dir.display()
    );
    Ok(files)
}

/// Move a processed file into `archive_dir`, returning its new path
///
/// Falls back to copy-and-delete when the rename crosses filesystems.
pub fn archive(path: &Path, archive_dir: &Path) -> AppResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::Io(format!("Not a file path: {}", path.display())))?;

    fs::create_dir_all(archive_dir)?;
    let target = archive_dir.join(file_name);

    if fs::rename(path, &target).is_err() {
        fs::copy(path, &target).map_err(|e| {
            AppError::Io(format!(
                "Failed to archive {} to {}: {}",
                path.display(),
                target.display(),
                e
            ))
        })?;
        fs::remove_file(path)?;
    }

    info!("Archived {} to {}", path.display(), target.display());
    Ok(target)
}
