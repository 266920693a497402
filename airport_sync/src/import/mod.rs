//! Airport import pipeline (CSV -> normalized rows -> linked, upserted airports).
//!
//! ## What this does
//! - Reads a CSV [`Source`] (local file or remote URL) fully into memory.
//! - **Normalizes** each row (types, ranges, derived `active` flag).
//! - Links each airport to its Country/City through a run-scoped
//!   [`LocationResolver`].
//! - **Upserts** the airport keyed on `ident` only. Re-running on unchanged
//!   input yields `created = 0` and leaves the table content identical.
//!
//! ## Transactions & consistency
//! Each airport write runs in its own **`BEGIN IMMEDIATE`** transaction via
//! `SqliteConnection::immediate_transaction`. A failing row is rolled back on
//! its own and counted under `errors`; rows committed before it stay.
//! Country/City get-or-create statements are idempotent single statements
//! and run before the row transaction.
//!
//! ## Dry-run
//! With [`ImportOptions::dry_run`] nothing is written. Counters report what
//! would happen (existing idents count as updates, new ones as creates).

pub mod normalize;
pub mod source;
pub mod summary;

use std::collections::HashSet;
use std::time::Instant;

use diesel::SqliteConnection;
use tracing::{info, warn};

use crate::config::ImportProfile;
use crate::errors::{ImportError, RowError};
use crate::repo::{self, UpsertOutcome};
use crate::resolver::{LocationResolver, ResolveMode, Resolution};

pub use normalize::{NormalizedAirport, RawRow, normalize_row};
pub use source::{DEFAULT_SOURCE_URL, Source};
pub use summary::ImportSummary;

/// Options for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Do not link airports to countries.
    pub skip_country_link: bool,
    /// Do not link airports to cities.
    pub skip_city_link: bool,
    /// Compute counters only; write nothing.
    pub dry_run: bool,
    /// Stop after this many source rows.
    pub row_limit: Option<usize>,
    /// Skip rows without a secondary (IATA) code.
    pub require_secondary_code: bool,
}

/// Load `source` and import it. A source failure aborts before any write.
pub fn run_import(
    conn: &mut SqliteConnection,
    source: &Source,
    opt: &ImportOptions,
    profile: &ImportProfile,
) -> Result<ImportSummary, ImportError> {
    let started = Instant::now();
    info!(%source, dry_run = opt.dry_run, "import started");

    let rows = source.load(profile.timeout())?;
    let mut summary = import_rows(conn, rows, opt, profile);
    summary.duration = started.elapsed();
    Ok(summary)
}

/// Fail when the share of rejected rows exceeds `max_rate`.
pub fn check_error_rate(summary: &ImportSummary, max_rate: f64) -> Result<(), ImportError> {
    if summary.error_rate() > max_rate {
        return Err(ImportError::ErrorRateExceeded {
            errors: summary.errors,
            rows_seen: summary.rows_seen,
            max_rate,
        });
    }
    Ok(())
}

/// Import already-parsed rows.
///
/// Never aborts on a bad row: validation failures and failed writes are
/// logged and counted under `errors`.
pub fn import_rows<I>(
    conn: &mut SqliteConnection,
    rows: I,
    opt: &ImportOptions,
    profile: &ImportProfile,
) -> ImportSummary
where
    I: IntoIterator<Item = Result<RawRow, RowError>>,
{
    let started = Instant::now();
    let mode = if opt.dry_run {
        ResolveMode::LookupOnly
    } else {
        ResolveMode::Persist
    };
    let mut resolver = LocationResolver::new(mode).with_country_names(profile.country_names());
    let mut summary = ImportSummary {
        dry_run: opt.dry_run,
        ..Default::default()
    };
    // Idents a dry run has already counted; a repeat would be an update.
    let mut dry_seen: HashSet<String> = HashSet::new();

    for (idx, raw) in rows.into_iter().enumerate() {
        if opt.row_limit.is_some_and(|limit| summary.rows_seen >= limit) {
            break;
        }
        summary.rows_seen += 1;
        // 1-based data row number, header excluded
        let line = idx + 1;

        let airport = match raw.and_then(|r| normalize_row(&r)) {
            Ok(a) => a,
            Err(e) => {
                warn!(row = line, error = %e, "row rejected");
                summary.errors += 1;
                continue;
            }
        };

        if opt.require_secondary_code && airport.iata_code.is_empty() {
            summary.skipped += 1;
            continue;
        }

        match import_one(conn, &mut resolver, &mut dry_seen, &airport, opt) {
            Ok((outcome, links)) => {
                match outcome {
                    UpsertOutcome::Created => summary.created += 1,
                    UpsertOutcome::Updated => summary.updated += 1,
                }
                if links.country {
                    summary.country_links += 1;
                }
                if links.city {
                    summary.city_links += 1;
                }
                if let Some(w) = links.warning {
                    warn!(row = line, ident = %airport.ident, warning = %w, "airport left unlinked");
                    summary.linkage_warnings += 1;
                }
            }
            Err(e) => {
                warn!(row = line, ident = %airport.ident, error = %e, "row write failed");
                summary.errors += 1;
            }
        }
    }

    let stats = resolver.stats();
    summary.countries_created = stats.countries_created;
    summary.cities_created = stats.cities_created;
    summary.duration = started.elapsed();

    info!(
        rows_seen = summary.rows_seen,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        errors = summary.errors,
        country_links = summary.country_links,
        city_links = summary.city_links,
        "import finished"
    );
    summary
}

/// Links actually assigned to one airport.
struct AssignedLinks {
    country: bool,
    city: bool,
    warning: Option<crate::resolver::LinkageWarning>,
}

fn import_one(
    conn: &mut SqliteConnection,
    resolver: &mut LocationResolver,
    dry_seen: &mut HashSet<String>,
    airport: &NormalizedAirport,
    opt: &ImportOptions,
) -> Result<(UpsertOutcome, AssignedLinks), RowError> {
    let resolution = if opt.skip_country_link && opt.skip_city_link {
        Resolution::default()
    } else {
        let locality = if opt.skip_city_link {
            ""
        } else {
            airport.municipality.as_str()
        };
        resolver.resolve(
            conn,
            &airport.iso_country,
            locality,
            airport.latitude,
            airport.longitude,
        )?
    };

    let country = if opt.skip_country_link {
        None
    } else {
        resolution.country.as_deref()
    };
    let city = if opt.skip_city_link {
        None
    } else {
        resolution.city
    };
    let links = AssignedLinks {
        country: country.is_some(),
        city: city.is_some(),
        warning: resolution.warning.clone(),
    };

    if opt.dry_run {
        let first_in_run = dry_seen.insert(airport.ident.clone());
        let outcome = if first_in_run && repo::airport_links(conn, &airport.ident)?.is_none() {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        };
        return Ok((outcome, links));
    }

    let outcome = conn.immediate_transaction::<_, RowError, _>(|conn| {
        // A skipped link keeps whatever the existing row already points at.
        let existing = repo::airport_links(conn, &airport.ident)?;
        let (old_country, old_city) = existing.unwrap_or_default();
        let country = if opt.skip_country_link {
            old_country.as_deref()
        } else {
            country
        };
        let city_id = if opt.skip_city_link {
            old_city
        } else {
            city.and_then(|c| c.id())
        };
        Ok(repo::upsert_airport(conn, &airport.as_row(country, city_id))?)
    })?;
    Ok((outcome, links))
}
