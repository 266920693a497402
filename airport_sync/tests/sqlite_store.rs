mod common;
use common::{assert_sqlite_pragmas, count, fk_check_empty, setup_db};

use airport_sync::db::{connection::connect_sqlite, migrate};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Integer;

#[derive(QueryableByName)]
struct TblCnt {
    #[diesel(sql_type = Integer)]
    cnt: i32,
}

#[test]
fn migrations_apply_and_pragmas_are_set() {
    let (db, mut conn) = setup_db();
    assert_sqlite_pragmas(&mut conn);

    let tbls: TblCnt = sql_query(
        "SELECT COUNT(*) AS cnt
            FROM sqlite_master
            WHERE type='table'
            AND name IN ('airport','city','country');",
    )
    .get_result(&mut conn)
    .unwrap();
    assert_eq!(tbls.cnt, 3, "expected three tables to be present");

    // Re-running is a no-op.
    migrate::run_all(&db.path).expect("second migration run");

    let mut second = connect_sqlite(&format!("sqlite://{}", db.path)).expect("connect second");
    assert_sqlite_pragmas(&mut second);
    fk_check_empty(&mut conn);
}

#[test]
fn postgres_urls_are_rejected() {
    assert!(migrate::run_all("postgres://localhost/airports").is_err());
}

#[test]
fn coordinate_checks_reject_bad_rows() {
    let (_db, mut conn) = setup_db();

    let res = sql_query(
        "INSERT INTO airport (ident, iata_code, name, airport_type, active, latitude, longitude,
                              iso_country, iso_region, municipality)
         VALUES ('X', '', 'X', 'small_airport', 1, 91.0, 0.0, 'US', '', '');",
    )
    .execute(&mut conn);
    assert!(res.is_err());

    let res = sql_query("INSERT INTO country (code, name, active) VALUES ('usa', 'x', 1);")
        .execute(&mut conn);
    assert!(res.is_err(), "country codes are two uppercase letters");

    assert_eq!(count(&mut conn, "airport"), 0);
}

#[test]
fn get_or_create_reports_creation_once() {
    use airport_sync::models::NewCity;
    use airport_sync::repo;

    let (_db, mut conn) = setup_db();

    let (us, created) = repo::get_or_create_country(&mut conn, "US", "United States").unwrap();
    assert!(created);
    assert_eq!(us.name, "United States");
    let (again, created) = repo::get_or_create_country(&mut conn, "US", "USA").unwrap();
    assert!(!created);
    assert_eq!(again, us);

    let new = NewCity {
        country_code: "US",
        name: "Denver",
        slug: "denver",
        timezone: None,
        population: None,
        latitude: Some(39.74),
        longitude: Some(-104.99),
        active: true,
    };
    let (city, created) = repo::get_or_create_city(&mut conn, &new).unwrap();
    assert!(created);
    let (same, created) = repo::get_or_create_city(&mut conn, &new).unwrap();
    assert!(!created);
    assert_eq!(same, city);
    assert_eq!(repo::count_cities(&mut conn).unwrap(), 1);
    assert_eq!(repo::count_countries(&mut conn).unwrap(), 1);
}
