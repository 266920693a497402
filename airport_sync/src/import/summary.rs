//! Aggregate counters for one import run.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::resolver::percent;

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// What an import run did. Everything but `duration` is deterministic for a
/// fixed input and starting database.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    /// Rows read from the source (up to the row limit).
    pub rows_seen: usize,
    /// Airports inserted (or that would be, in a dry run).
    pub created: usize,
    /// Airports overwritten (or that would be, in a dry run).
    pub updated: usize,
    /// Rows skipped on purpose (e.g. no secondary code when one is required).
    pub skipped: usize,
    /// Rows rejected by validation or failed writes.
    pub errors: usize,
    /// Imported airports linked to a country.
    pub country_links: usize,
    /// Imported airports linked to a city.
    pub city_links: usize,
    /// Rows whose country could not be resolved.
    pub linkage_warnings: usize,
    /// Countries created during the run.
    pub countries_created: usize,
    /// Cities created during the run.
    pub cities_created: usize,
    /// Whether writes were suppressed.
    pub dry_run: bool,
    /// Wall-clock time of the run, serialized as seconds.
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
}

impl ImportSummary {
    /// Airports created or updated.
    pub fn imported(&self) -> usize {
        self.created + self.updated
    }

    /// Share of imported airports linked to a country, in percent.
    pub fn country_coverage(&self) -> f64 {
        percent(self.country_links, self.imported())
    }

    /// Share of imported airports linked to a city, in percent.
    pub fn city_coverage(&self) -> f64 {
        percent(self.city_links, self.imported())
    }

    /// `errors / rows_seen`, or 0 for an empty source.
    pub fn error_rate(&self) -> f64 {
        if self.rows_seen == 0 {
            0.0
        } else {
            self.errors as f64 / self.rows_seen as f64
        }
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.dry_run {
            "Import summary (dry run)"
        } else {
            "Import summary"
        };
        let underline = |f: &mut fmt::Formatter<'_>, title: &str| -> fmt::Result {
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.len()))
        };

        underline(f, title)?;
        writeln!(f, "{:<9} : {}", "rows seen", self.rows_seen)?;
        writeln!(f, "{:<9} : {}", "created", self.created)?;
        writeln!(f, "{:<9} : {}", "updated", self.updated)?;
        writeln!(f, "{:<9} : {}", "skipped", self.skipped)?;
        writeln!(f, "{:<9} : {}", "errors", self.errors)?;
        writeln!(f)?;

        underline(f, "Linkage")?;
        let imported = self.imported();
        writeln!(
            f,
            "{:<9} : {}/{} ({:.1}%)",
            "countries",
            self.country_links,
            imported,
            self.country_coverage()
        )?;
        writeln!(
            f,
            "{:<9} : {}/{} ({:.1}%)",
            "cities",
            self.city_links,
            imported,
            self.city_coverage()
        )?;
        writeln!(f, "{:<9} : {}", "warnings", self.linkage_warnings)?;
        writeln!(
            f,
            "{:<9} : {} countries, {} cities",
            "new", self.countries_created, self.cities_created
        )?;
        writeln!(f)?;

        write!(f, "Took {:.2}s", self.duration.as_secs_f64())
    }
}
