#![allow(dead_code)]

use airport_sync::config::ImportProfile;
use airport_sync::db::{connection, migrate};
use airport_sync::errors::RowError;
use airport_sync::import::source::parse_csv;
use airport_sync::import::{ImportOptions, ImportSummary, RawRow, import_rows};
use airport_sync::models::Airport;
use airport_sync::schema::airport;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use std::path::PathBuf;
use tempfile::TempDir;

/// Six rows around Denver plus Calgary: one closed, one with a latitude out
/// of range, one without a country code.
pub const FIXTURE_CSV: &str = "\
id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,continent,iso_country,iso_region,municipality,iata_code
3486,KDEN,large_airport,Denver International Airport,39.8561,-104.6737,5434,NA,US,US-CO,Denver,DEN
3500,KCOS,medium_airport,City of Colorado Springs Municipal Airport,38.8058,-104.7008,6187,NA,US,US-CO,Colorado Springs,COS
9001,00CO,closed,Cass Field,39.7400,-104.9900,5280,NA,US,US-CO,Denver,
1851,CYYC,large_airport,Calgary International Airport,51.1139,-114.0203,3557,NA,CA,CA-AB,Calgary,YYC
9002,XBAD,small_airport,Bad Latitude Strip,95.0,10.0,,NA,US,US-CO,Nowhere,
9003,XNOC,heliport,No Country Heliport,45.0,-100.0,,NA,,,Boulder,
";

/// Downtown Denver.
pub const DENVER: (f64, f64) = (39.7392, -104.9903);

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    n: i64,
}
#[derive(QueryableByName)]
struct FkViolation {
    #[diesel(sql_type = Text)]
    table: String,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let c: Count = diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table};"))
        .get_result(conn)
        .unwrap();
    c.n
}

pub fn fk_check_empty(conn: &mut SqliteConnection) {
    let violations: Vec<FkViolation> = diesel::sql_query("PRAGMA foreign_key_check;")
        .load(conn)
        .unwrap();
    let tables: Vec<String> = violations.into_iter().map(|v| v.table).collect();
    assert!(tables.is_empty(), "foreign key violations in {tables:?}");
}

pub fn rows(csv: &str) -> Vec<Result<RawRow, RowError>> {
    parse_csv(csv.as_bytes().to_vec()).expect("fixture csv parses")
}

pub fn import(conn: &mut SqliteConnection, csv: &str, opt: &ImportOptions) -> ImportSummary {
    import_rows(conn, rows(csv), opt, &ImportProfile::default())
}

/// Minimal CSV of active small airports in country ZZ.
pub fn points_csv(points: &[(&str, f64, f64)]) -> String {
    let mut csv = String::from("ident,type,name,latitude_deg,longitude_deg,iso_country,municipality\n");
    for (ident, lat, lon) in points {
        csv.push_str(&format!("{ident},small_airport,{ident} Field,{lat},{lon},ZZ,\n"));
    }
    csv
}

pub fn airports(conn: &mut SqliteConnection) -> Vec<Airport> {
    airport::table
        .order(airport::ident.asc())
        .select(Airport::as_select())
        .load(conn)
        .unwrap()
}

pub fn airport_by_ident(conn: &mut SqliteConnection, ident: &str) -> Airport {
    airport::table
        .find(ident)
        .select(Airport::as_select())
        .first(conn)
        .unwrap()
}
