//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::country`]: ISO 3166-1 alpha-2 registry, referenced by airports
//! - [`crate::schema::city`]: cities owned by a country, unique per `(country_code, slug)`
//! - [`crate::schema::airport`]: one point of interest keyed by its stable `ident`
//!
//! See the migration for constraints: `airport.country_code` is `ON DELETE RESTRICT`,
//! `airport.city_id` is `ON DELETE SET NULL`, and `city.country_code` cascades.

use diesel::prelude::*;
use serde::Serialize;

use crate::schema::*;

/// Airport category that marks a record as no longer in service.
pub const CLOSED_CATEGORY: &str = "closed";

/// Derive the `active` flag from an airport category.
pub fn is_active_category(category: &str) -> bool {
    category != CLOSED_CATEGORY
}

// ----------------------- country -----------------------

/// A row in [`crate::schema::country`].
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = country, primary_key(code), check_for_backend(diesel::sqlite::Sqlite))]
pub struct Country {
    /// ISO 3166-1 alpha-2 code (primary key), e.g. "US".
    pub code: String,
    /// Display name; equals `code` when no name table supplied one.
    pub name: String,
    /// Whether the country is offered to users.
    pub active: bool,
}

/// Insertable form of [`Country`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = country)]
pub struct NewCountry<'a> {
    /// ISO 3166-1 alpha-2 code.
    pub code: &'a str,
    /// Display name.
    pub name: &'a str,
    /// Whether the country is offered to users.
    pub active: bool,
}

// ----------------------- city --------------------------

/// A row in [`crate::schema::city`].
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations, Selectable, Serialize)]
#[diesel(table_name = city, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(Country, foreign_key = country_code))]
pub struct City {
    /// Database primary key.
    pub id: i32,
    /// Owning country, FK to [`Country::code`].
    pub country_code: String,
    /// Locality name as first seen in the source data.
    pub name: String,
    /// URL-safe form of `name`; unique within the country.
    pub slug: String,
    /// Optional IANA timezone name.
    pub timezone: Option<String>,
    /// Optional population count.
    pub population: Option<i32>,
    /// Approximate latitude (first airport seen in the city).
    pub latitude: Option<f64>,
    /// Approximate longitude (first airport seen in the city).
    pub longitude: Option<f64>,
    /// Whether the city is offered to users.
    pub active: bool,
}

/// Insertable form of [`City`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = city)]
pub struct NewCity<'a> {
    /// Owning country code.
    pub country_code: &'a str,
    /// Locality name.
    pub name: &'a str,
    /// Slug of `name`.
    pub slug: &'a str,
    /// Optional IANA timezone name.
    pub timezone: Option<&'a str>,
    /// Optional population count.
    pub population: Option<i32>,
    /// Approximate latitude.
    pub latitude: Option<f64>,
    /// Approximate longitude.
    pub longitude: Option<f64>,
    /// Whether the city is offered to users.
    pub active: bool,
}

// ----------------------- airport -----------------------

/// A row in [`crate::schema::airport`]: one point of interest.
///
/// `ident` is the upstream identifier and the only key used to decide
/// insert-vs-update on import.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = airport, primary_key(ident), check_for_backend(diesel::sqlite::Sqlite))]
pub struct Airport {
    /// Stable external identifier (ICAO or local code).
    pub ident: String,
    /// Three-letter IATA code, or empty.
    pub iata_code: String,
    /// Display name.
    pub name: String,
    /// Category, e.g. "large_airport" or "closed".
    pub airport_type: String,
    /// `airport_type != "closed"`.
    pub active: bool,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Elevation in feet, when known.
    pub elevation_ft: Option<i32>,
    /// Raw ISO country code from the source.
    pub iso_country: String,
    /// Raw ISO region code from the source.
    pub iso_region: String,
    /// Raw locality name from the source.
    pub municipality: String,
    /// Resolved country link.
    pub country_code: Option<String>,
    /// Resolved city link.
    pub city_id: Option<i32>,
}

/// Insert/update form of [`Airport`].
///
/// `treat_none_as_null` makes an update overwrite every column, links included.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = airport, primary_key(ident), treat_none_as_null = true)]
pub struct AirportRow<'a> {
    /// Stable external identifier.
    pub ident: &'a str,
    /// Three-letter IATA code, or empty.
    pub iata_code: &'a str,
    /// Display name.
    pub name: &'a str,
    /// Category string, stored untouched.
    pub airport_type: &'a str,
    /// Derived from `airport_type`.
    pub active: bool,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Elevation in feet.
    pub elevation_ft: Option<i32>,
    /// Raw ISO country code.
    pub iso_country: &'a str,
    /// Raw ISO region code.
    pub iso_region: &'a str,
    /// Raw locality name.
    pub municipality: &'a str,
    /// Country link.
    pub country_code: Option<&'a str>,
    /// City link.
    pub city_id: Option<i32>,
}
