mod common;
use common::{FIXTURE_CSV, airport_by_ident, airports, count, fk_check_empty, import, setup_db};

use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;

use airport_sync::config::{ImportProfile, load_profile_str};
use airport_sync::errors::{ImportError, SourceError};
use airport_sync::import::{ImportOptions, Source, check_error_rate, run_import};
use airport_sync::repo;
use airport_sync::schema::{airport, city, country};

use diesel::prelude::*;
use diesel::sql_query;

#[test]
fn first_import_creates_and_links() {
    let (_db, mut conn) = setup_db();

    let s = import(&mut conn, FIXTURE_CSV, &ImportOptions::default());
    assert_eq!(s.rows_seen, 6);
    assert_eq!(s.created, 5);
    assert_eq!(s.updated, 0);
    assert_eq!(s.errors, 1, "latitude 95 is rejected");
    assert_eq!(s.skipped, 0);
    assert_eq!(s.country_links, 4);
    assert_eq!(s.city_links, 4);
    assert_eq!(s.linkage_warnings, 1, "blank iso_country");
    assert_eq!(s.countries_created, 2);
    assert_eq!(s.cities_created, 3);

    assert_eq!(repo::count_airports(&mut conn).unwrap(), 5);
    assert_eq!(repo::count_countries(&mut conn).unwrap(), 2);
    assert_eq!(repo::count_cities(&mut conn).unwrap(), 3);

    // Both Denver airports share one city.
    let den = airport_by_ident(&mut conn, "KDEN");
    let cass = airport_by_ident(&mut conn, "00CO");
    assert_eq!(den.country_code.as_deref(), Some("US"));
    assert!(den.city_id.is_some());
    assert_eq!(den.city_id, cass.city_id);
    assert!(den.active);
    assert!(!cass.active);
    assert_eq!(den.iata_code, "DEN");
    assert_eq!(den.elevation_ft, Some(5434));

    let unlinked = airport_by_ident(&mut conn, "XNOC");
    assert_eq!(unlinked.country_code, None);
    assert_eq!(unlinked.city_id, None);

    fk_check_empty(&mut conn);
}

#[test]
fn reimport_is_idempotent() {
    let (_db, mut conn) = setup_db();

    import(&mut conn, FIXTURE_CSV, &ImportOptions::default());
    let before = airports(&mut conn);

    let s = import(&mut conn, FIXTURE_CSV, &ImportOptions::default());
    assert_eq!(s.created, 0);
    assert_eq!(s.updated, 5);
    assert_eq!(s.errors, 1);
    assert_eq!(s.countries_created, 0);
    assert_eq!(s.cities_created, 0);

    assert_eq!(airports(&mut conn), before);
    assert_eq!(count(&mut conn, "country"), 2);
    assert_eq!(count(&mut conn, "city"), 3);
}

#[test]
fn changed_row_overwrites_every_field() {
    let (_db, mut conn) = setup_db();
    import(&mut conn, FIXTURE_CSV, &ImportOptions::default());

    let changed = FIXTURE_CSV.replace(
        "Denver International Airport,39.8561,-104.6737,5434",
        "Denver Intl,39.8562,-104.6738,",
    );
    let s = import(&mut conn, &changed, &ImportOptions::default());
    assert_eq!(s.created, 0);
    assert_eq!(s.updated, 5);

    let den = airport_by_ident(&mut conn, "KDEN");
    assert_eq!(den.name, "Denver Intl");
    assert_eq!(den.latitude, 39.8562);
    assert_eq!(den.elevation_ft, None, "blank elevation clears the stored value");
}

#[test]
fn dry_run_writes_nothing_but_reports() {
    let (_db, mut conn) = setup_db();

    let s = import(
        &mut conn,
        FIXTURE_CSV,
        &ImportOptions {
            dry_run: true,
            ..Default::default()
        },
    );
    assert!(s.dry_run);
    assert_eq!(s.created, 5);
    assert_eq!(s.errors, 1);
    assert_eq!(s.countries_created, 2);
    assert_eq!(s.cities_created, 3);
    assert_eq!(s.city_links, 4);

    assert_eq!(count(&mut conn, "airport"), 0);
    assert_eq!(count(&mut conn, "country"), 0);
    assert_eq!(count(&mut conn, "city"), 0);

    // Against a populated store everything is an update.
    import(&mut conn, FIXTURE_CSV, &ImportOptions::default());
    let s = import(
        &mut conn,
        FIXTURE_CSV,
        &ImportOptions {
            dry_run: true,
            ..Default::default()
        },
    );
    assert_eq!(s.created, 0);
    assert_eq!(s.updated, 5);
    assert_eq!(s.countries_created, 0);
    assert_eq!(s.cities_created, 0);
}

#[test]
fn require_secondary_code_skips_without_creating_parents() {
    let (_db, mut conn) = setup_db();

    let s = import(
        &mut conn,
        FIXTURE_CSV,
        &ImportOptions {
            require_secondary_code: true,
            ..Default::default()
        },
    );
    assert_eq!(s.created, 3);
    assert_eq!(s.skipped, 2);
    assert_eq!(s.errors, 1);
    assert_eq!(s.linkage_warnings, 0, "skipped rows are never resolved");

    let idents: Vec<String> = airport::table
        .select(airport::ident)
        .order(airport::ident.asc())
        .load(&mut conn)
        .unwrap();
    assert_eq!(idents, ["CYYC", "KCOS", "KDEN"]);
}

#[test]
fn row_limit_stops_early() {
    let (_db, mut conn) = setup_db();

    let s = import(
        &mut conn,
        FIXTURE_CSV,
        &ImportOptions {
            row_limit: Some(2),
            ..Default::default()
        },
    );
    assert_eq!(s.rows_seen, 2);
    assert_eq!(s.created, 2);
    assert_eq!(count(&mut conn, "airport"), 2);
}

#[test]
fn skipping_both_links_creates_no_parents() {
    let (_db, mut conn) = setup_db();

    let s = import(
        &mut conn,
        FIXTURE_CSV,
        &ImportOptions {
            skip_country_link: true,
            skip_city_link: true,
            ..Default::default()
        },
    );
    assert_eq!(s.created, 5);
    assert_eq!(s.country_links, 0);
    assert_eq!(s.city_links, 0);
    assert_eq!(count(&mut conn, "country"), 0);
    assert_eq!(count(&mut conn, "city"), 0);
    assert!(airports(&mut conn).iter().all(|a| a.country_code.is_none() && a.city_id.is_none()));
}

#[test]
fn skipping_city_link_keeps_existing_city() {
    let (_db, mut conn) = setup_db();
    import(&mut conn, FIXTURE_CSV, &ImportOptions::default());
    let linked = airport_by_ident(&mut conn, "KDEN").city_id;
    assert!(linked.is_some());

    let s = import(
        &mut conn,
        FIXTURE_CSV,
        &ImportOptions {
            skip_city_link: true,
            ..Default::default()
        },
    );
    assert_eq!(s.city_links, 0);
    assert_eq!(s.country_links, 4);
    assert_eq!(airport_by_ident(&mut conn, "KDEN").city_id, linked);
}

#[test]
fn skipping_city_link_on_fresh_store_links_countries_only() {
    let (_db, mut conn) = setup_db();

    import(
        &mut conn,
        FIXTURE_CSV,
        &ImportOptions {
            skip_city_link: true,
            ..Default::default()
        },
    );
    assert_eq!(count(&mut conn, "country"), 2);
    assert_eq!(count(&mut conn, "city"), 0);
    assert_eq!(airport_by_ident(&mut conn, "KDEN").country_code.as_deref(), Some("US"));
}

#[test]
fn profile_names_new_countries() {
    let (_db, mut conn) = setup_db();
    let profile = load_profile_str("[countries.us]\nname = \"United States\"\n").unwrap();

    airport_sync::import::import_rows(
        &mut conn,
        common::rows(FIXTURE_CSV),
        &ImportOptions::default(),
        &profile,
    );

    let us = repo::find_country(&mut conn, "US").unwrap().unwrap();
    assert_eq!(us.name, "United States");
    let ca = repo::find_country(&mut conn, "CA").unwrap().unwrap();
    assert_eq!(ca.name, "CA");
}

#[test]
fn file_source_round_trip() {
    let (_db, mut conn) = setup_db();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FIXTURE_CSV.as_bytes()).unwrap();

    let source = Source::File(file.path().to_path_buf());
    let s = run_import(
        &mut conn,
        &source,
        &ImportOptions::default(),
        &ImportProfile::default(),
    )
    .expect("import");
    assert_eq!(s.created, 5);
    assert!(s.duration > Duration::ZERO);
}

#[test]
fn missing_file_aborts_before_writing() {
    let (_db, mut conn) = setup_db();

    let err = run_import(
        &mut conn,
        &Source::File("/definitely/not/here/airports.csv".into()),
        &ImportOptions::default(),
        &ImportProfile::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::Source(SourceError::Io { .. })));
    assert_eq!(count(&mut conn, "airport"), 0);
}

#[test]
fn missing_columns_abort_before_writing() {
    let (_db, mut conn) = setup_db();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"ident,name\nKDEN,Denver\n").unwrap();

    let err = run_import(
        &mut conn,
        &Source::File(file.path().to_path_buf()),
        &ImportOptions::default(),
        &ImportProfile::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::Source(SourceError::MissingColumns(_))));
    assert_eq!(count(&mut conn, "airport"), 0);
}

#[test]
fn error_rate_threshold() {
    let (_db, mut conn) = setup_db();
    let s = import(&mut conn, FIXTURE_CSV, &ImportOptions::default());

    // 1 of 6 rows failed.
    let err = check_error_rate(&s, ImportProfile::default().max_error_rate()).unwrap_err();
    match err {
        ImportError::ErrorRateExceeded {
            errors, rows_seen, ..
        } => assert_eq!((errors, rows_seen), (1, 6)),
        other => panic!("unexpected error: {other}"),
    }
    check_error_rate(&s, 0.2).expect("within threshold");
}

#[test]
fn country_in_use_cannot_be_deleted() {
    let (_db, mut conn) = setup_db();
    import(&mut conn, FIXTURE_CSV, &ImportOptions::default());

    let res = diesel::delete(country::table.find("CA")).execute(&mut conn);
    assert!(res.is_err(), "airport.country_code restricts deletes");
    assert_eq!(count(&mut conn, "country"), 2);
}

#[test]
fn deleting_city_unlinks_airports() {
    let (_db, mut conn) = setup_db();
    import(&mut conn, FIXTURE_CSV, &ImportOptions::default());
    let city_id = airport_by_ident(&mut conn, "KDEN").city_id.unwrap();

    diesel::delete(city::table.find(city_id))
        .execute(&mut conn)
        .unwrap();

    assert_eq!(airport_by_ident(&mut conn, "KDEN").city_id, None);
    assert_eq!(airport_by_ident(&mut conn, "00CO").city_id, None);
    assert_eq!(airport_by_ident(&mut conn, "KDEN").country_code.as_deref(), Some("US"));
    fk_check_empty(&mut conn);
}

#[test]
fn dry_run_counts_repeated_ident_as_update() {
    let (_db, mut conn) = setup_db();
    let csv = common::points_csv(&[("AAAA", 1.0, 1.0), ("AAAA", 1.5, 1.5), ("BBBB", 2.0, 2.0)]);

    let dry = import(
        &mut conn,
        &csv,
        &ImportOptions {
            dry_run: true,
            ..Default::default()
        },
    );
    assert_eq!(count(&mut conn, "airport"), 0);

    let real = import(&mut conn, &csv, &ImportOptions::default());
    assert_eq!((real.created, real.updated), (2, 1));
    assert_eq!((dry.created, dry.updated), (real.created, real.updated));
}

#[test]
fn failed_write_is_counted_and_batch_continues() {
    let (_db, mut conn) = setup_db();
    sql_query(
        "CREATE TRIGGER reject_kcos BEFORE INSERT ON airport
         WHEN NEW.ident = 'KCOS'
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .execute(&mut conn)
    .unwrap();

    let s = import(&mut conn, FIXTURE_CSV, &ImportOptions::default());
    assert_eq!(s.created, 4);
    assert_eq!(s.errors, 2, "latitude 95 plus the aborted insert");
    assert_eq!(count(&mut conn, "airport"), 4);
    assert_eq!(airport_by_ident(&mut conn, "KDEN").iata_code, "DEN");
    assert_eq!(airport_by_ident(&mut conn, "CYYC").iata_code, "YYC");
    fk_check_empty(&mut conn);
}

#[test]
fn unreachable_url_aborts_before_writing() {
    let (_db, mut conn) = setup_db();

    let err = run_import(
        &mut conn,
        &Source::Url("http://127.0.0.1:9/airports.csv".into()),
        &ImportOptions::default(),
        &ImportProfile::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::Source(SourceError::Request(_))), "{err}");
    assert_eq!(count(&mut conn, "airport"), 0);
}

#[test]
fn http_error_status_aborts_before_writing() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf);
        stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .unwrap();
    });

    let (_db, mut conn) = setup_db();
    let err = run_import(
        &mut conn,
        &Source::Url(format!("http://{addr}/airports.csv")),
        &ImportOptions::default(),
        &ImportProfile::default(),
    )
    .unwrap_err();
    server.join().unwrap();

    match err {
        ImportError::Source(SourceError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count(&mut conn, "airport"), 0);
}
