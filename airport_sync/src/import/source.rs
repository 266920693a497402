//! Where import rows come from: a local CSV file or a remote URL.
//!
//! The whole source is read into memory and its header checked before the
//! caller sees a single row, so a failed or truncated download aborts the run
//! before anything is written.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::errors::{RowError, SourceError};
use crate::import::normalize::{REQUIRED_COLUMNS, RawRow};

/// Public OurAirports export used when no source is configured.
pub const DEFAULT_SOURCE_URL: &str =
    "https://davidmegginson.github.io/ourairports-data/airports.csv";

/// A CSV source of airport rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Local file path.
    File(PathBuf),
    /// Remote URL fetched over HTTP(S).
    Url(String),
}

impl Source {
    /// Read the whole source and split it into rows.
    ///
    /// Fatal problems (unreadable file, failed download, bad header) are a
    /// [`SourceError`]; a bad individual record becomes an `Err` row.
    pub fn load(&self, timeout: Duration) -> Result<Vec<Result<RawRow, RowError>>, SourceError> {
        let bytes = match self {
            Source::File(path) => std::fs::read(path).map_err(|source| SourceError::Io {
                path: path.display().to_string(),
                source,
            })?,
            Source::Url(url) => fetch(url, timeout)?,
        };
        info!(source = %self, bytes = bytes.len(), "source loaded");
        parse_csv(bytes)
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

/// Download `url` completely, failing on transport errors and non-2xx statuses.
pub fn fetch(url: &str, timeout: Duration) -> Result<Vec<u8>, SourceError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;
    let resp = client.get(url).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp.bytes()?.to_vec())
}

/// Split CSV bytes into header-keyed rows.
///
/// The header must contain every column in [`REQUIRED_COLUMNS`]; unknown
/// columns are carried along and ignored later.
pub fn parse_csv(bytes: Vec<u8>) -> Result<Vec<Result<RawRow, RowError>>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(bytes));

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SourceError::MissingColumns(missing));
    }

    let rows = rdr
        .records()
        .map(|record| {
            record
                .map(|rec| {
                    headers
                        .iter()
                        .zip(rec.iter())
                        .map(|(h, v)| (h.to_string(), v.to_string()))
                        .collect::<RawRow>()
                })
                .map_err(|e| RowError::Malformed(e.to_string()))
        })
        .collect();
    Ok(rows)
}
