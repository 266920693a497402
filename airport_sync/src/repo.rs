//! Get-or-create and upsert statements for the location tables.
//!
//! Every write is a single statement (`INSERT .. ON CONFLICT DO NOTHING RETURNING`,
//! or an `UPDATE` keyed on the primary key), so repeated calls are idempotent.
//! A conflict returns no row, and the existing one is selected instead.

use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};

use crate::models::{AirportRow, City, Country, NewCity, NewCountry};
use crate::schema::{airport, city, country};

/// Whether an upsert inserted a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row had this key; one was inserted.
    Created,
    /// A row with this key existed and was overwritten.
    Updated,
}

/// Load a country by code.
pub fn find_country(conn: &mut SqliteConnection, code: &str) -> QueryResult<Option<Country>> {
    country::table
        .find(code)
        .select(Country::as_select())
        .first(conn)
        .optional()
}

/// Get the country with `code`, creating it with `name` if missing.
///
/// Returns the row and whether it was created by this call. An existing
/// country keeps its name.
pub fn get_or_create_country(
    conn: &mut SqliteConnection,
    code: &str,
    name: &str,
) -> QueryResult<(Country, bool)> {
    let row = NewCountry {
        code,
        name,
        active: true,
    };
    let inserted = insert_into(country::table)
        .values(&row)
        .on_conflict(country::code)
        .do_nothing()
        .returning(Country::as_returning())
        .get_result(conn)
        .optional()?;
    if let Some(created) = inserted {
        return Ok((created, true));
    }

    let found = country::table
        .find(code)
        .select(Country::as_select())
        .first(conn)?;
    Ok((found, false))
}

/// Load a city by its natural key.
pub fn find_city(
    conn: &mut SqliteConnection,
    country_code: &str,
    slug: &str,
) -> QueryResult<Option<City>> {
    city::table
        .filter(city::country_code.eq(country_code).and(city::slug.eq(slug)))
        .select(City::as_select())
        .first(conn)
        .optional()
}

/// Get the city keyed by `(country_code, slug)`, creating it from `new` if missing.
///
/// Two names that slug the same within a country resolve to one city.
pub fn get_or_create_city(conn: &mut SqliteConnection, new: &NewCity) -> QueryResult<(City, bool)> {
    let inserted = insert_into(city::table)
        .values(new)
        .on_conflict((city::country_code, city::slug))
        .do_nothing()
        .returning(City::as_returning())
        .get_result(conn)
        .optional()?;
    if let Some(created) = inserted {
        return Ok((created, true));
    }

    let found = city::table
        .filter(
            city::country_code
                .eq(new.country_code)
                .and(city::slug.eq(new.slug)),
        )
        .select(City::as_select())
        .first(conn)?;
    Ok((found, false))
}

/// Current `(country_code, city_id)` links of an airport, if the airport exists.
pub fn airport_links(
    conn: &mut SqliteConnection,
    ident: &str,
) -> QueryResult<Option<(Option<String>, Option<i32>)>> {
    airport::table
        .find(ident)
        .select((airport::country_code, airport::city_id))
        .first(conn)
        .optional()
}

/// Insert the airport, or overwrite every column of the existing row with the same `ident`.
///
/// Callers wanting atomic read-then-write run this inside a transaction.
pub fn upsert_airport(conn: &mut SqliteConnection, row: &AirportRow) -> QueryResult<UpsertOutcome> {
    let exists = airport_links(conn, row.ident)?.is_some();
    if exists {
        diesel::update(airport::table.find(row.ident))
            .set(row)
            .execute(conn)?;
        Ok(UpsertOutcome::Updated)
    } else {
        insert_into(airport::table).values(row).execute(conn)?;
        Ok(UpsertOutcome::Created)
    }
}

/// Number of airports.
pub fn count_airports(conn: &mut SqliteConnection) -> QueryResult<i64> {
    airport::table.count().get_result(conn)
}

/// Number of countries.
pub fn count_countries(conn: &mut SqliteConnection) -> QueryResult<i64> {
    country::table.count().get_result(conn)
}

/// Number of cities.
pub fn count_cities(conn: &mut SqliteConnection) -> QueryResult<i64> {
    city::table.count().get_result(conn)
}
