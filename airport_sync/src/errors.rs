//! Error kinds for import and query.
//!
//! The split matters to operators: a [`SourceError`] means nothing was
//! written for the run, while [`RowError`]s are counted per row and the
//! batch carries on.

use thiserror::Error;

use crate::geo::CoordinateError;

/// A single source row could not be turned into an airport record.
#[derive(Debug, Error)]
pub enum RowError {
    /// A required column is absent or blank.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A numeric column holds something that is not a number.
    #[error("invalid number in '{column}': {value:?}")]
    InvalidNumber {
        /// Source column name.
        column: &'static str,
        /// Offending cell content.
        value: String,
    },

    /// Latitude or longitude outside the valid range.
    #[error(transparent)]
    Coordinates(#[from] CoordinateError),

    /// The CSV record itself could not be decoded (wrong field count, bad UTF-8, ...).
    #[error("malformed record: {0}")]
    Malformed(String),

    /// The row was valid but writing it failed; the row transaction was rolled back.
    #[error("database write failed: {0}")]
    Write(#[from] diesel::result::Error),
}

/// The data source could not be read at all. Fatal for the run.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Network failure while downloading.
    #[error("download failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Remote server answered with a non-success status.
    #[error("download of {url} failed with HTTP {status}")]
    Status {
        /// URL that was requested.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The CSV header row could not be parsed.
    #[error("unparseable CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Header row lacks columns every record needs.
    #[error("CSV header is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Failure of a whole import run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Source fetch/parse failed before any row was written.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The run finished but too many rows were rejected.
    #[error("{errors} of {rows_seen} rows failed, above the allowed error rate of {max_rate}")]
    ErrorRateExceeded {
        /// Rows counted under `errors`.
        errors: usize,
        /// Rows read from the source.
        rows_seen: usize,
        /// Configured threshold in [0, 1].
        max_rate: f64,
    },
}

/// Invalid input to, or failure of, a nearest-airport query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Query point is not a valid coordinate; nothing was executed.
    #[error("invalid query point: {0}")]
    InvalidCoordinates(#[from] CoordinateError),

    /// A result limit of zero was requested.
    #[error("limit must be at least 1")]
    InvalidLimit,

    /// The store could not be read.
    #[error("database query failed: {0}")]
    Database(#[from] diesel::result::Error),
}
