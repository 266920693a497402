//! Nearest-airport queries.
//!
//! A query runs in two stages: a bounding-box range query on
//! `(latitude, longitude)` trims the candidate set, then exact haversine
//! distances rank what is left.
//!
//! The box starts at [`INITIAL_DELTA_DEG`] degrees either side of the query
//! point and doubles until it holds at least `limit` candidates *and* the
//! circle through the farthest kept candidate fits inside it. Only then can no
//! airport outside the box be closer. Boxes that would cross a pole or the
//! antimeridian, or grow past [`MAX_DELTA_DEG`], fall back to a full scan.
//! The starting size suits continental airport density (a few hundred km).

use std::cmp::Ordering;

use diesel::SqliteConnection;
use diesel::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::errors::QueryError;
use crate::geo::{BoundingBox, Unit, haversine_km, validate_coordinates};
use crate::models::Airport;
use crate::schema::airport;

/// Results returned when the caller does not ask for a specific count.
pub const DEFAULT_LIMIT: usize = 3;

/// Half-width of the first bounding box, in degrees.
pub const INITIAL_DELTA_DEG: f64 = 2.0;

/// Largest half-width tried before scanning every active airport.
pub const MAX_DELTA_DEG: f64 = 64.0;

/// Parameters of a nearest-airport query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestQuery {
    /// Query latitude in degrees.
    pub latitude: f64,
    /// Query longitude in degrees.
    pub longitude: f64,
    /// Maximum number of results.
    pub limit: usize,
    /// Optional ISO country filter (case-insensitive).
    pub country: Option<String>,
    /// Unit of the reported distances.
    pub unit: Unit,
}

impl NearestQuery {
    /// Query with default limit, no country filter, kilometers.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            limit: DEFAULT_LIMIT,
            country: None,
            unit: Unit::Kilometers,
        }
    }

    /// Set the result limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Restrict to one country.
    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country = Some(code.into());
        self
    }

    /// Report distances in `unit`.
    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }
}

/// One ranked result. `distance` is computed per query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestAirport {
    /// The airport row.
    #[serde(flatten)]
    pub airport: Airport,
    /// Great-circle distance from the query point, in `unit`.
    pub distance: f64,
    /// Unit of `distance`.
    pub unit: Unit,
}

/// The `limit` nearest active airports to the query point, closest first.
///
/// Ties on distance are ordered by `ident`. Fewer than `limit` results means
/// fewer matching airports exist.
pub fn nearest(
    conn: &mut SqliteConnection,
    query: &NearestQuery,
) -> Result<Vec<NearestAirport>, QueryError> {
    validate_coordinates(query.latitude, query.longitude)?;
    if query.limit == 0 {
        return Err(QueryError::InvalidLimit);
    }
    let country = query
        .country
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());
    let (lat, lon) = (query.latitude, query.longitude);

    let mut delta = INITIAL_DELTA_DEG;
    let ranked = loop {
        let bbox = BoundingBox::around(lat, lon, delta);
        if delta > MAX_DELTA_DEG || bbox.crosses_edge() {
            debug!(delta, "bounding box exhausted, scanning all active airports");
            let all = load_candidates(conn, None, country.as_deref())?;
            break rank(all, lat, lon);
        }

        let ranked = rank(load_candidates(conn, Some(&bbox), country.as_deref())?, lat, lon);
        debug!(delta, candidates = ranked.len(), "bounding box pre-filter");
        if ranked.len() >= query.limit {
            let farthest_km = ranked[query.limit - 1].1;
            if bbox.contains_circle(lat, lon, farthest_km) {
                break ranked;
            }
        }
        delta *= 2.0;
    };

    Ok(ranked
        .into_iter()
        .take(query.limit)
        .map(|(airport, km)| NearestAirport {
            airport,
            distance: query.unit.from_km(km),
            unit: query.unit,
        })
        .collect())
}

fn load_candidates(
    conn: &mut SqliteConnection,
    bbox: Option<&BoundingBox>,
    country: Option<&str>,
) -> QueryResult<Vec<Airport>> {
    let mut q = airport::table
        .filter(airport::active.eq(true))
        .select(Airport::as_select())
        .into_boxed();
    if let Some(b) = bbox {
        q = q
            .filter(airport::latitude.between(b.min_lat, b.max_lat))
            .filter(airport::longitude.between(b.min_lon, b.max_lon));
    }
    if let Some(code) = country {
        q = q.filter(airport::iso_country.eq(code.to_string()));
    }
    q.load(conn)
}

/// Attach distances (km) and sort ascending, ties by `ident`.
fn rank(candidates: Vec<Airport>, lat: f64, lon: f64) -> Vec<(Airport, f64)> {
    let mut ranked: Vec<(Airport, f64)> = candidates
        .into_iter()
        .map(|a| {
            let km = haversine_km(lat, lon, a.latitude, a.longitude);
            (a, km)
        })
        .collect();
    ranked.sort_by(|(a, da), (b, db)| match da.total_cmp(db) {
        Ordering::Equal => a.ident.cmp(&b.ident),
        other => other,
    });
    ranked
}
