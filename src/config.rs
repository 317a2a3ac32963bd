use anyhow::{Context, Result, bail};
use std::env;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DATA_DIR_ENV: &str = "STREAMSTATS_DATA_DIR";
const HISTORY_FILE_PREFIX: &str = "Streaming_History_Audio_";
const HISTORY_FILE_EXTENSION: &str = "json";

pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Ok(override_dir) = env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }
    env::current_dir().context("failed to determine the current directory")
}

pub fn is_history_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.starts_with(HISTORY_FILE_PREFIX)
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(HISTORY_FILE_EXTENSION))
}

/// Export chunks sorted by file name, which orders them chronologically.
pub fn discover_history_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("data directory {} does not exist", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        if entry.file_type().is_file() && is_history_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn resolve_input_files(files: Vec<PathBuf>, dir: Option<&Path>) -> Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files);
    }

    let dir = data_dir(dir)?;
    let found = discover_history_files(&dir)?;
    if found.is_empty() {
        bail!(
            "no {HISTORY_FILE_PREFIX}*.{HISTORY_FILE_EXTENSION} files found in {}",
            dir.display()
        );
    }
    log::info!("found {} history files in {}", found.len(), dir.display());
    Ok(found)
}
