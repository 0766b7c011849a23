//! Report files on disk.

use chrono::{DateTime, Local};
use fleet::Report;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("[{}] exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to create output directory [{}]", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize report")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report [{}]", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.json` inside `dir`.
pub fn report_path(dir: &Path, prefix: &str, started: DateTime<Local>) -> PathBuf {
    dir.join(format!("{prefix}_{}.json", started.format("%Y%m%d_%H%M%S")))
}

/// Writes `report` as JSON, creating `dir` if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot
/// be written.
pub fn write_report(
    report: &Report,
    dir: &Path,
    prefix: &str,
    started: DateTime<Local>,
    indent: bool,
) -> Result<PathBuf, OutputError> {
    ensure_dir(dir)?;

    let json = if indent {
        serde_json::to_vec_pretty(report)?
    } else {
        serde_json::to_vec(report)?
    };

    let path = report_path(dir, prefix, started);
    fs::write(&path, json).map_err(|source| OutputError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    if dir.exists() {
        return if dir.is_dir() {
            Ok(())
        } else {
            Err(OutputError::NotADirectory(dir.to_path_buf()))
        };
    }

    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Deletes every `*.json` file in `dir` except `keep`. Returns the files
/// that could not be deleted.
pub fn clean_up_except(dir: &Path, keep: &Path) -> Vec<(PathBuf, io::Error)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => return vec![(dir.to_path_buf(), e)],
    };

    let mut failures = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures.push((dir.to_path_buf(), e));
                continue;
            }
        };

        let path = entry.path();
        let is_file = entry.file_type().is_ok_and(|t| t.is_file());
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if !is_file || !is_json || Some(entry.file_name().as_os_str()) == keep.file_name() {
            continue;
        }

        if let Err(e) = fs::remove_file(&path) {
            failures.push((path, e));
        }
    }
    failures
}
