use std::path::PathBuf;

use airport_sync::config::{ImportProfile, load_profile_path};
use airport_sync::db::{connection, migrate};
use airport_sync::geo::Unit;
use airport_sync::import::{self, DEFAULT_SOURCE_URL, ImportOptions, Source};
use airport_sync::nearest::{self, DEFAULT_LIMIT, NearestQuery};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(version, about = "Airport import and nearest-airport lookup")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Import (or refresh) airports from a CSV file or URL.
    Import {
        /// Local CSV file.
        #[arg(long, value_name = "FILE", conflicts_with = "url")]
        file: Option<PathBuf>,
        /// Remote CSV URL.
        #[arg(long)]
        url: Option<String>,
        /// TOML import profile.
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        skip_country_link: bool,
        #[arg(long)]
        skip_city_link: bool,
        /// Stop after N source rows.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
        /// Skip airports without an IATA code.
        #[arg(long)]
        require_secondary_code: bool,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the airports nearest to a point.
    #[command(allow_negative_numbers = true)]
    Nearest {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// ISO country code filter.
        #[arg(long)]
        country: Option<String>,
        /// km or mi.
        #[arg(long, default_value = "km")]
        unit: Unit,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let db_url = shared_utils::get_env_var("DATABASE_URL")?;
    migrate::run_all(&db_url)?;
    let mut conn = connection::connect_sqlite(&db_url)?;

    match cli.cmd {
        Cmd::Import {
            file,
            url,
            profile,
            dry_run,
            skip_country_link,
            skip_city_link,
            limit,
            require_secondary_code,
            json,
        } => {
            let profile = match profile {
                Some(path) => load_profile_path(&path)?,
                None => ImportProfile::default(),
            };
            let source = match (file, url) {
                (Some(path), _) => Source::File(path),
                (None, Some(url)) => Source::Url(url),
                (None, None) => Source::Url(
                    shared_utils::get_env_var_or("AIRPORTS_CSV_URL")
                        .or_else(|| profile.source_url.clone())
                        .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                ),
            };
            let opt = ImportOptions {
                skip_country_link,
                skip_city_link,
                dry_run,
                row_limit: limit,
                require_secondary_code,
            };

            let summary = import::run_import(&mut conn, &source, &opt, &profile)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
            import::check_error_rate(&summary, profile.max_error_rate())?;
        }
        Cmd::Nearest {
            lat,
            lon,
            limit,
            country,
            unit,
            json,
        } => {
            let mut query = NearestQuery::new(lat, lon).limit(limit).unit(unit);
            if let Some(code) = country {
                query = query.country(code);
            }
            let results = nearest::nearest(&mut conn, &query)
                .with_context(|| format!("nearest airports to ({lat}, {lon})"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No airports found.");
            } else {
                for (i, r) in results.iter().enumerate() {
                    let a = &r.airport;
                    let iata = if a.iata_code.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", a.iata_code)
                    };
                    println!(
                        "{:>2}. {:<8}{iata} {}, {} {:.1} {}",
                        i + 1,
                        a.ident,
                        a.name,
                        a.iso_country,
                        r.distance,
                        r.unit
                    );
                }
            }
        }
    }

    Ok(())
}
