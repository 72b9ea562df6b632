//! Batched reads and seeding for the two-tier centroid cache
//! (`zip_centroids`, `city_centroids`).
//!
//! Callers collect every distinct key needed across a whole import run and
//! issue chunked `= ANY($1)` reads instead of one round-trip per row. A miss
//! is never an error; it only means the next resolution tier runs.

use sqlx::PgPool;

use crate::DbError;

/// Keys per batched lookup statement.
const LOOKUP_CHUNK_SIZE: usize = 500;

/// Rows per seeding upsert statement.
const SEED_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ZipCentroidRow {
    pub zip: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// `city` is stored lowercased; `zip` is the canonical ZIP used to backfill
/// rows imported without one.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CityCentroidRow {
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zip: Option<String>,
}

/// Fetch centroids for the given normalized 5-digit ZIPs, in chunks.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if any chunk query fails.
pub async fn fetch_zip_centroids(
    pool: &PgPool,
    zips: &[String],
) -> Result<Vec<ZipCentroidRow>, sqlx::Error> {
    let mut rows = Vec::new();
    for chunk in zips.chunks(LOOKUP_CHUNK_SIZE) {
        let mut batch = sqlx::query_as::<_, ZipCentroidRow>(
            "SELECT zip, latitude, longitude, city, state \
             FROM zip_centroids WHERE zip = ANY($1::TEXT[])",
        )
        .bind(chunk)
        .fetch_all(pool)
        .await?;
        rows.append(&mut batch);
    }
    Ok(rows)
}

/// Fetch centroids for the given lowercased city names, in chunks. State
/// filtering happens in the caller's cache; fetching by city alone keeps the
/// key a flat text array.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if any chunk query fails.
pub async fn fetch_city_centroids(
    pool: &PgPool,
    cities_lowercase: &[String],
) -> Result<Vec<CityCentroidRow>, sqlx::Error> {
    let mut rows = Vec::new();
    for chunk in cities_lowercase.chunks(LOOKUP_CHUNK_SIZE) {
        let mut batch = sqlx::query_as::<_, CityCentroidRow>(
            "SELECT city, state, latitude, longitude, zip \
             FROM city_centroids WHERE city = ANY($1::TEXT[])",
        )
        .bind(chunk)
        .fetch_all(pool)
        .await?;
        rows.append(&mut batch);
    }
    Ok(rows)
}

/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_zip_centroids(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM zip_centroids")
        .fetch_one(pool)
        .await
}

/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_city_centroids(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM city_centroids")
        .fetch_one(pool)
        .await
}

/// Upsert ZIP centroids in one transaction, chunked UNNEST statements.
/// Returns the number of rows processed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the whole seed rolls
/// back.
pub async fn seed_zip_centroids(
    pool: &PgPool,
    entries: &[ZipCentroidRow],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for chunk in entries.chunks(SEED_CHUNK_SIZE) {
        let zips: Vec<String> = chunk.iter().map(|e| e.zip.clone()).collect();
        let lats: Vec<f64> = chunk.iter().map(|e| e.latitude).collect();
        let lngs: Vec<f64> = chunk.iter().map(|e| e.longitude).collect();
        let cities: Vec<Option<String>> = chunk.iter().map(|e| e.city.clone()).collect();
        let states: Vec<Option<String>> = chunk.iter().map(|e| e.state.clone()).collect();

        sqlx::query(
            "INSERT INTO zip_centroids (zip, latitude, longitude, city, state) \
             SELECT * FROM UNNEST($1::TEXT[], $2::DOUBLE PRECISION[], \
                                  $3::DOUBLE PRECISION[], $4::TEXT[], $5::TEXT[]) \
             ON CONFLICT (zip) DO UPDATE SET \
                 latitude = EXCLUDED.latitude, \
                 longitude = EXCLUDED.longitude, \
                 city = EXCLUDED.city, \
                 state = EXCLUDED.state",
        )
        .bind(&zips)
        .bind(&lats)
        .bind(&lngs)
        .bind(&cities)
        .bind(&states)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(entries.len())
}

/// Upsert city centroids in one transaction, chunked UNNEST statements.
/// City values are lowercased here so the primary key matches case-insensitive
/// lookups. Returns the number of rows processed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the whole seed rolls
/// back.
pub async fn seed_city_centroids(
    pool: &PgPool,
    entries: &[CityCentroidRow],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for chunk in entries.chunks(SEED_CHUNK_SIZE) {
        let cities: Vec<String> = chunk.iter().map(|e| e.city.to_lowercase()).collect();
        let states: Vec<String> = chunk.iter().map(|e| e.state.clone()).collect();
        let lats: Vec<f64> = chunk.iter().map(|e| e.latitude).collect();
        let lngs: Vec<f64> = chunk.iter().map(|e| e.longitude).collect();
        let zips: Vec<Option<String>> = chunk.iter().map(|e| e.zip.clone()).collect();

        sqlx::query(
            "INSERT INTO city_centroids (city, state, latitude, longitude, zip) \
             SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[], $3::DOUBLE PRECISION[], \
                                  $4::DOUBLE PRECISION[], $5::TEXT[]) \
             ON CONFLICT (city, state) DO UPDATE SET \
                 latitude = EXCLUDED.latitude, \
                 longitude = EXCLUDED.longitude, \
                 zip = EXCLUDED.zip",
        )
        .bind(&cities)
        .bind(&states)
        .bind(&lats)
        .bind(&lngs)
        .bind(&zips)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(entries.len())
}
