//! Persistence for derived tables.
//!
//! Every report is a CSV file rewritten in full on each run, next to a JSON
//! manifest describing the run.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{LapDataError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

/// One file written during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Summary of a run, written as `manifest.json` in the output directory.
#[derive(Debug, Serialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub reports: Vec<ReportEntry>,
}

impl RunManifest {
    pub fn new(reports: Vec<ReportEntry>) -> Self {
        RunManifest {
            generated_at: Utc::now(),
            reports,
        }
    }
}

/// A report row type with a fixed set of CSV columns.
///
/// `COLUMNS` must list the serialized field names in order. It provides the
/// header when a report has no rows.
pub trait Tabular {
    const COLUMNS: &'static [&'static str];
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> LapDataError + '_ {
    move |source| LapDataError::Write {
        path: path.to_path_buf(),
        source,
    }
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error(path))?;
    }
    File::create(path).map_err(write_error(path))
}

/// Writes `rows` to a CSV file at `path`, replacing any previous contents.
///
/// The header row is always written, so an empty table still names its
/// columns.
pub fn write_records<T: Serialize + Tabular>(path: &Path, rows: &[T]) -> Result<usize> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV report");

    let mut writer = WriterBuilder::new().from_writer(create(path)?);
    if rows.is_empty() {
        writer
            .write_record(T::COLUMNS)
            .map_err(|e| write_error(path)(std::io::Error::other(e)))?;
    }
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| write_error(path)(std::io::Error::other(e)))?;
    }
    writer.flush().map_err(write_error(path))?;

    Ok(rows.len())
}

/// Writes `rows` to `dir/file_name` and describes the result.
pub fn write_report<T: Serialize + Tabular>(
    dir: &Path,
    name: &str,
    file_name: &str,
    rows: &[T],
) -> Result<ReportEntry> {
    let path = dir.join(file_name);
    let rows = write_records(&path, rows)?;
    info!(report = name, path = %path.display(), rows, "Report written");

    Ok(ReportEntry {
        name: name.to_string(),
        path,
        rows,
    })
}

/// Writes the run manifest as pretty-printed JSON into `dir`.
pub fn write_manifest(dir: &Path, manifest: &RunManifest) -> Result<PathBuf> {
    let path = dir.join(MANIFEST_FILE);
    let file = create(&path)?;
    serde_json::to_writer_pretty(file, manifest)
        .map_err(|e| write_error(&path)(std::io::Error::other(e)))?;
    Ok(path)
}
