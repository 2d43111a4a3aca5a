//! Error taxonomy for loading telemetry tables.
//!
//! Only structural problems are errors. A single field that fails to parse is
//! recorded as missing and counted by the loader, and an aggregate over no
//! valid values is `None`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LapDataError {
    #[error("input file {path} is missing or unreadable")]
    MissingInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input file {path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("input file {path} is not valid CSV")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, LapDataError>;
