//! Airport reference data: idempotent CSV import into SQLite and
//! nearest-airport lookup.
//!
//! The import pipeline ([`import`]) reads an OurAirports-style CSV, normalizes
//! each row, links it to a [`models::Country`] and [`models::City`] through the
//! [`resolver`], and upserts it by `ident`. Queries ([`nearest`]) rank active
//! airports by great-circle distance ([`geo`]).

#![deny(missing_docs)]

pub mod config;
pub mod db;
pub mod errors;
pub mod geo;
pub mod import;
pub mod models;
pub mod nearest;
pub mod repo;
pub mod resolver;
#[allow(missing_docs)]
pub mod schema;
