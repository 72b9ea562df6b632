//! Database maintenance handlers: ping, migrate, centroid seeding.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use sqlx::PgPool;

use fieldroster_db::{CityCentroidRow, ZipCentroidRow};

/// Row count above which a centroid table is considered already seeded and
/// the seed is skipped unless forced.
const SEED_SKIP_THRESHOLD: i64 = 1_000;

#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Verify database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Bulk-load the ZIP and city centroid caches from CSV datasets
    SeedCentroids {
        /// CSV of zip,latitude,longitude,city,state
        #[arg(long)]
        zip_file: Option<PathBuf>,

        /// CSV of city,state,latitude,longitude,zip
        #[arg(long)]
        city_file: Option<PathBuf>,

        /// Re-seed even when the tables already look populated
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(pool: &PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            fieldroster_db::ping(pool).await?;
            println!("database connection ok");
            Ok(())
        }
        DbCommands::Migrate => {
            let applied = fieldroster_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
        DbCommands::SeedCentroids {
            zip_file,
            city_file,
            force,
        } => run_seed_centroids(pool, zip_file.as_deref(), city_file.as_deref(), force).await,
    }
}

async fn run_seed_centroids(
    pool: &PgPool,
    zip_file: Option<&Path>,
    city_file: Option<&Path>,
    force: bool,
) -> anyhow::Result<()> {
    if zip_file.is_none() && city_file.is_none() {
        anyhow::bail!("nothing to seed: pass --zip-file and/or --city-file");
    }

    if let Some(path) = zip_file {
        let existing = fieldroster_db::count_zip_centroids(pool).await?;
        if existing > SEED_SKIP_THRESHOLD && !force {
            println!("zip_centroids already holds {existing} rows; skipping (use --force to re-seed)");
        } else {
            let entries = parse_zip_centroid_file(path)?;
            let seeded = fieldroster_db::seed_zip_centroids(pool, &entries).await?;
            println!("seeded {seeded} ZIP centroids from {}", path.display());
        }
    }

    if let Some(path) = city_file {
        let existing = fieldroster_db::count_city_centroids(pool).await?;
        if existing > SEED_SKIP_THRESHOLD && !force {
            println!("city_centroids already holds {existing} rows; skipping (use --force to re-seed)");
        } else {
            let entries = parse_city_centroid_file(path)?;
            let seeded = fieldroster_db::seed_city_centroids(pool, &entries).await?;
            println!("seeded {seeded} city centroids from {}", path.display());
        }
    }

    Ok(())
}

/// Parse `zip,latitude,longitude[,city,state]`. Rows whose coordinates do
/// not parse (the header included) are skipped with a warning.
fn parse_zip_centroid_file(path: &Path) -> anyhow::Result<Vec<ZipCentroidRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut entries = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let zip = record.get(0).unwrap_or("").trim();
        let lat = record.get(1).unwrap_or("").trim().parse::<f64>();
        let lng = record.get(2).unwrap_or("").trim().parse::<f64>();
        match (lat, lng) {
            (Ok(latitude), Ok(longitude)) if !zip.is_empty() => {
                entries.push(ZipCentroidRow {
                    zip: zip.to_string(),
                    latitude,
                    longitude,
                    city: non_empty(record.get(3)),
                    state: non_empty(record.get(4)),
                });
            }
            _ => {
                if index > 0 {
                    tracing::warn!(line = index + 1, "unparseable ZIP centroid row skipped");
                }
            }
        }
    }
    Ok(entries)
}

/// Parse `city,state,latitude,longitude[,zip]` the same way.
fn parse_city_centroid_file(path: &Path) -> anyhow::Result<Vec<CityCentroidRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut entries = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let city = record.get(0).unwrap_or("").trim();
        let state = record.get(1).unwrap_or("").trim();
        let lat = record.get(2).unwrap_or("").trim().parse::<f64>();
        let lng = record.get(3).unwrap_or("").trim().parse::<f64>();
        match (lat, lng) {
            (Ok(latitude), Ok(longitude)) if !city.is_empty() && !state.is_empty() => {
                entries.push(CityCentroidRow {
                    city: city.to_string(),
                    state: state.to_string(),
                    latitude,
                    longitude,
                    zip: non_empty(record.get(4)),
                });
            }
            _ => {
                if index > 0 {
                    tracing::warn!(line = index + 1, "unparseable city centroid row skipped");
                }
            }
        }
    }
    Ok(entries)
}

fn non_empty(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
