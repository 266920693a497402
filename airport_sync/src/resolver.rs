//! Country/City linking for imported airports.
//!
//! [`LocationResolver`] maps raw `(country_code, locality_name)` pairs onto
//! persisted [`Country`](crate::models::Country) and [`City`](crate::models::City)
//! rows, creating them the first time a code or name is seen.
//!
//! Notes:
//! - A resolver is scoped to one import run. Its lookup cache lives inside the
//!   value, so separate runs (or concurrent runs in one process) never share
//!   stale entries. The cache only saves queries; every write underneath is an
//!   idempotent get-or-create.
//! - Malformed input never fails: an invalid country code yields an unlinked
//!   [`Resolution`] carrying a [`LinkageWarning`]. Only database errors surface.
//! - In [`ResolveMode::LookupOnly`] nothing is written; links that would be
//!   created are still reported (cities as [`CityRef::Pending`]).

use std::collections::{HashMap, HashSet};
use std::fmt;

use diesel::{QueryResult, SqliteConnection};
use serde::Serialize;
use tracing::debug;

use crate::config::is_country_code;
use crate::models::NewCity;
use crate::repo;

/// Whether the resolver may create missing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Get-or-create countries and cities.
    Persist,
    /// Read only; report what would be created (dry runs).
    LookupOnly,
}

/// Non-fatal linkage problem. The airport is still imported, just unlinked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkageWarning {
    /// Country code is blank or not two uppercase letters.
    InvalidCountryCode {
        /// The code as received.
        code: String,
    },
}

impl fmt::Display for LinkageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkageWarning::InvalidCountryCode { code } if code.is_empty() => {
                write!(f, "blank country code")
            }
            LinkageWarning::InvalidCountryCode { code } => {
                write!(f, "invalid country code {code:?}")
            }
        }
    }
}

/// Reference to a resolved city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityRef {
    /// An existing (or just created) city row.
    Linked(i32),
    /// Would be created; only produced in [`ResolveMode::LookupOnly`].
    Pending,
}

impl CityRef {
    /// Row id, when the city exists.
    pub fn id(self) -> Option<i32> {
        match self {
            CityRef::Linked(id) => Some(id),
            CityRef::Pending => None,
        }
    }
}

/// Outcome of resolving one `(country_code, locality_name)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Country code to link, if the code was valid.
    pub country: Option<String>,
    /// City to link, if a locality was given and the country resolved.
    pub city: Option<CityRef>,
    /// Set when the pair could not be linked.
    pub warning: Option<LinkageWarning>,
}

/// Linkage coverage counters for one resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkageStats {
    /// Calls to [`LocationResolver::resolve`].
    pub total: usize,
    /// Calls that produced a country link.
    pub country_links: usize,
    /// Calls that produced a city link.
    pub city_links: usize,
    /// Calls that produced a [`LinkageWarning`].
    pub warnings: usize,
    /// Countries inserted by this resolver (or missing, in lookup-only mode).
    pub countries_created: usize,
    /// Cities inserted by this resolver (or missing, in lookup-only mode).
    pub cities_created: usize,
}

impl LinkageStats {
    /// Share of calls linked to a country, in percent.
    pub fn country_coverage(&self) -> f64 {
        percent(self.country_links, self.total)
    }

    /// Share of calls linked to a city, in percent.
    pub fn city_coverage(&self) -> f64 {
        percent(self.city_links, self.total)
    }
}

pub(crate) fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// URL-safe lowercase form of a locality name.
///
/// Runs of anything that is not a letter or digit become one `-`; apostrophes
/// are dropped. Non-ASCII letters are kept (lowercased).
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut gap = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('-');
            }
            gap = false;
            out.push(ch);
        } else {
            gap = true;
        }
    }
    out
}

/// Resolves country/locality pairs to Country/City rows for one import run.
pub struct LocationResolver {
    mode: ResolveMode,
    country_names: HashMap<String, String>,
    known_countries: HashSet<String>,
    pending_cities: HashSet<(String, String)>,
    cache: HashMap<(String, String), Resolution>,
    stats: LinkageStats,
}

impl LocationResolver {
    /// Fresh resolver with an empty cache.
    pub fn new(mode: ResolveMode) -> Self {
        Self {
            mode,
            country_names: HashMap::new(),
            known_countries: HashSet::new(),
            pending_cities: HashSet::new(),
            cache: HashMap::new(),
            stats: LinkageStats::default(),
        }
    }

    /// Supply display names for countries this resolver creates.
    pub fn with_country_names(mut self, names: impl IntoIterator<Item = (String, String)>) -> Self {
        self.country_names.extend(names);
        self
    }

    /// Coverage counters so far.
    pub fn stats(&self) -> LinkageStats {
        self.stats
    }

    /// Resolve a pair to country/city references, creating rows as needed.
    ///
    /// `lat`/`lon` seed the approximate position of a newly created city.
    pub fn resolve(
        &mut self,
        conn: &mut SqliteConnection,
        country_code: &str,
        locality_name: &str,
        lat: f64,
        lon: f64,
    ) -> QueryResult<Resolution> {
        let key = (country_code.to_string(), locality_name.trim().to_string());
        let resolution = match self.cache.get(&key) {
            Some(hit) => hit.clone(),
            None => {
                let fresh = self.resolve_uncached(conn, &key.0, &key.1, lat, lon)?;
                self.cache.insert(key, fresh.clone());
                fresh
            }
        };

        self.stats.total += 1;
        if resolution.country.is_some() {
            self.stats.country_links += 1;
        }
        if resolution.city.is_some() {
            self.stats.city_links += 1;
        }
        if resolution.warning.is_some() {
            self.stats.warnings += 1;
        }
        Ok(resolution)
    }

    fn resolve_uncached(
        &mut self,
        conn: &mut SqliteConnection,
        code: &str,
        locality: &str,
        lat: f64,
        lon: f64,
    ) -> QueryResult<Resolution> {
        if !is_country_code(code) {
            return Ok(Resolution {
                warning: Some(LinkageWarning::InvalidCountryCode {
                    code: code.to_string(),
                }),
                ..Default::default()
            });
        }
        self.ensure_country(conn, code)?;

        let slug = slugify(locality);
        if slug.is_empty() {
            return Ok(Resolution {
                country: Some(code.to_string()),
                ..Default::default()
            });
        }

        let city = match self.mode {
            ResolveMode::Persist => {
                let new = NewCity {
                    country_code: code,
                    name: locality,
                    slug: &slug,
                    timezone: None,
                    population: None,
                    latitude: Some(lat),
                    longitude: Some(lon),
                    active: true,
                };
                let (city, created) = repo::get_or_create_city(conn, &new)?;
                if created {
                    self.stats.cities_created += 1;
                    debug!(country = code, slug = %slug, id = city.id, "created city");
                }
                CityRef::Linked(city.id)
            }
            ResolveMode::LookupOnly => match repo::find_city(conn, code, &slug)? {
                Some(city) => CityRef::Linked(city.id),
                None => {
                    if self.pending_cities.insert((code.to_string(), slug.clone())) {
                        self.stats.cities_created += 1;
                    }
                    CityRef::Pending
                }
            },
        };

        Ok(Resolution {
            country: Some(code.to_string()),
            city: Some(city),
            warning: None,
        })
    }

    fn ensure_country(&mut self, conn: &mut SqliteConnection, code: &str) -> QueryResult<()> {
        if self.known_countries.contains(code) {
            return Ok(());
        }
        let created = match self.mode {
            ResolveMode::Persist => {
                let name = self
                    .country_names
                    .get(code)
                    .map(String::as_str)
                    .unwrap_or(code);
                let (_, created) = repo::get_or_create_country(conn, code, name)?;
                if created {
                    debug!(code, name, "created country");
                }
                created
            }
            ResolveMode::LookupOnly => repo::find_country(conn, code)?.is_none(),
        };
        if created {
            self.stats.countries_created += 1;
        }
        self.known_countries.insert(code.to_string());
        Ok(())
    }
}
