use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("creating output folder {}", path.display()))
}

pub fn timestamp_string(dt: &DateTime<Local>) -> String {
    dt.format("%Y%m%d_%H%M%S").to_string()
}

/// `<folder>/<prefix>_<YYYYMMDD_HHMMSS>.<suffix>`, stamped with the run's
/// start time so the filename identifies the session.
pub fn build_timestamped_path(
    folder: &Path,
    prefix: &str,
    dt: &DateTime<Local>,
    suffix: &str,
) -> PathBuf {
    let suffix = suffix.trim_start_matches('.');
    folder.join(format!("{prefix}_{}.{suffix}", timestamp_string(dt)))
}

pub fn save_log_json<T: Serialize>(log: &T, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    serde_json::to_writer_pretty(file, log)
        .with_context(|| format!("writing log file {}", path.display()))
}
