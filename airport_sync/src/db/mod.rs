//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON, and a 5000ms busy_timeout.
//! - Embedded Diesel migrations and runners: [`migrate::run_sqlite`] and [`migrate::run_all`],
//!   which accepts bare file paths as well as `sqlite:` URLs.
//!
//! Example:
//! ```no_run
//! use airport_sync::db::{migrate, connection};
//!
//! let db_path = std::env::temp_dir().join("airport_sync_example.db");
//! migrate::run_all(db_path.to_str().unwrap()).expect("migrations");
//!
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```
//!
//! Foreign keys are what enforce the country "protect" rule and the city
//! "set null" rule, so always open connections through [`connection::connect_sqlite`].

pub mod connection;
pub mod migrate;
