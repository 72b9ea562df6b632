//! Database operations for the `technicians` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use fieldroster_core::{Priority, Technician};

use crate::DbError;

/// Specialty tags are carried through SQL as one `;`-joined text value per
/// row so a batch can be bound as flat parallel arrays; `string_to_array`
/// rebuilds the `TEXT[]` column inside the statement.
const SPECIALTY_DELIMITER: &str = ";";

/// Keys per `= ANY($1)` lookup; bounds statement size on large imports.
const LOOKUP_CHUNK_SIZE: usize = 500;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Input record for inserting a technician.
#[derive(Debug, Clone)]
pub struct NewTechnician {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub service_radius_miles: f64,
    pub specialties: Vec<String>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub is_new: bool,
    pub created_by: Option<String>,
}

impl NewTechnician {
    fn specialties_joined(&self) -> String {
        self.specialties.join(SPECIALTY_DELIMITER)
    }
}

/// A row from the `technicians` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TechnicianRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub service_radius_miles: f64,
    pub specialties: Vec<String>,
    pub priority: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub is_new: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TechnicianRow> for Technician {
    fn from(row: TechnicianRow) -> Self {
        Technician {
            id: row.id,
            public_id: row.public_id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            city: row.city,
            state: row.state,
            zip: row.zip,
            latitude: row.latitude,
            longitude: row.longitude,
            service_radius_miles: row.service_radius_miles,
            specialties: row.specialties,
            priority: Priority::parse_or_default(&row.priority),
            notes: row.notes,
            is_active: row.is_active,
            is_new: row.is_new,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, public_id, name, phone, email, city, state, zip, \
     latitude, longitude, service_radius_miles, specialties, priority, \
     notes, is_active, is_new, created_by, created_at, updated_at";

// ---------------------------------------------------------------------------
// Write operations
// ---------------------------------------------------------------------------

/// Insert a batch of technicians in a single `INSERT … SELECT FROM UNNEST`
/// round-trip.
///
/// Returns the number of rows inserted. The statement is all-or-nothing: a
/// failure (e.g. one duplicate phone in the batch) inserts none of the rows.
/// The import persister uses that to fall back to per-row inserts.
///
/// Takes any executor so callers can run several chunks inside one
/// transaction.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn insert_technicians_batch<'e, E>(
    executor: E,
    records: &[NewTechnician],
) -> Result<u64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    if records.is_empty() {
        return Ok(0);
    }

    let mut names: Vec<String> = Vec::with_capacity(records.len());
    let mut phones: Vec<Option<String>> = Vec::with_capacity(records.len());
    let mut emails: Vec<Option<String>> = Vec::with_capacity(records.len());
    let mut cities: Vec<String> = Vec::with_capacity(records.len());
    let mut states: Vec<String> = Vec::with_capacity(records.len());
    let mut zips: Vec<Option<String>> = Vec::with_capacity(records.len());
    let mut latitudes: Vec<f64> = Vec::with_capacity(records.len());
    let mut longitudes: Vec<f64> = Vec::with_capacity(records.len());
    let mut radii: Vec<f64> = Vec::with_capacity(records.len());
    let mut specialties: Vec<String> = Vec::with_capacity(records.len());
    let mut priorities: Vec<String> = Vec::with_capacity(records.len());
    let mut notes: Vec<Option<String>> = Vec::with_capacity(records.len());
    let mut is_news: Vec<bool> = Vec::with_capacity(records.len());
    let mut created_bys: Vec<Option<String>> = Vec::with_capacity(records.len());

    for rec in records {
        names.push(rec.name.clone());
        phones.push(rec.phone.clone());
        emails.push(rec.email.clone());
        cities.push(rec.city.clone());
        states.push(rec.state.clone());
        zips.push(rec.zip.clone());
        latitudes.push(rec.latitude);
        longitudes.push(rec.longitude);
        radii.push(rec.service_radius_miles);
        specialties.push(rec.specialties_joined());
        priorities.push(rec.priority.to_string());
        notes.push(rec.notes.clone());
        is_news.push(rec.is_new);
        created_bys.push(rec.created_by.clone());
    }

    let result = sqlx::query(
        "INSERT INTO technicians \
             (name, phone, email, city, state, zip, latitude, longitude, \
              service_radius_miles, specialties, priority, notes, is_new, created_by) \
         SELECT t.name, t.phone, t.email, t.city, t.state, t.zip, t.latitude, t.longitude, \
                t.radius, \
                COALESCE(string_to_array(NULLIF(t.specialty, ''), ';'), '{}'), \
                t.priority, t.notes, t.is_new, t.created_by \
         FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[], $4::TEXT[], $5::TEXT[], $6::TEXT[], \
                     $7::DOUBLE PRECISION[], $8::DOUBLE PRECISION[], $9::DOUBLE PRECISION[], \
                     $10::TEXT[], $11::TEXT[], $12::TEXT[], $13::BOOLEAN[], $14::TEXT[]) \
              AS t(name, phone, email, city, state, zip, latitude, longitude, radius, \
                   specialty, priority, notes, is_new, created_by)",
    )
    .bind(&names)
    .bind(&phones)
    .bind(&emails)
    .bind(&cities)
    .bind(&states)
    .bind(&zips)
    .bind(&latitudes)
    .bind(&longitudes)
    .bind(&radii)
    .bind(&specialties)
    .bind(&priorities)
    .bind(&notes)
    .bind(&is_news)
    .bind(&created_bys)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Insert a single technician, returning its new id.
///
/// # Errors
///
/// Returns [`DbError::DuplicatePhone`] when the phone unique index rejects
/// the row, or [`DbError::Sqlx`] for any other failure.
pub async fn insert_technician(pool: &PgPool, rec: &NewTechnician) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO technicians \
             (name, phone, email, city, state, zip, latitude, longitude, \
              service_radius_miles, specialties, priority, notes, is_new, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, \
                 COALESCE(string_to_array(NULLIF($10, ''), ';'), '{}'), \
                 $11, $12, $13, $14) \
         RETURNING id",
    )
    .bind(&rec.name)
    .bind(&rec.phone)
    .bind(&rec.email)
    .bind(&rec.city)
    .bind(&rec.state)
    .bind(&rec.zip)
    .bind(rec.latitude)
    .bind(rec.longitude)
    .bind(rec.service_radius_miles)
    .bind(rec.specialties_joined())
    .bind(rec.priority.to_string())
    .bind(&rec.notes)
    .bind(rec.is_new)
    .bind(&rec.created_by)
    .fetch_one(pool)
    .await
    .map_err(classify_insert_error)?;

    Ok(id)
}

/// Overwrite a technician's mutable fields.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that id,
/// [`DbError::DuplicatePhone`] on a phone conflict, or [`DbError::Sqlx`]
/// otherwise.
pub async fn update_technician(
    pool: &PgPool,
    id: i64,
    rec: &NewTechnician,
) -> Result<(), DbError> {
    let rows = sqlx::query(
        "UPDATE technicians SET \
             name = $2, phone = $3, email = $4, city = $5, state = $6, zip = $7, \
             latitude = $8, longitude = $9, service_radius_miles = $10, \
             specialties = COALESCE(string_to_array(NULLIF($11, ''), ';'), '{}'), \
             priority = $12, notes = $13, is_new = $14, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&rec.name)
    .bind(&rec.phone)
    .bind(&rec.email)
    .bind(&rec.city)
    .bind(&rec.state)
    .bind(&rec.zip)
    .bind(rec.latitude)
    .bind(rec.longitude)
    .bind(rec.service_radius_miles)
    .bind(rec.specialties_joined())
    .bind(rec.priority.to_string())
    .bind(&rec.notes)
    .bind(rec.is_new)
    .execute(pool)
    .await
    .map_err(classify_insert_error)?
    .rows_affected();

    if rows == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Toggle the active flag. Returns the number of rows affected (0 when the
/// id does not exist).
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn set_technician_active(
    pool: &PgPool,
    id: i64,
    active: bool,
) -> Result<u64, sqlx::Error> {
    let rows = sqlx::query(
        "UPDATE technicians SET is_active = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(active)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows)
}

/// Delete technicians by id, individually or in bulk. Returns the number of
/// rows removed.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn delete_technicians(pool: &PgPool, ids: &[i64]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let rows = sqlx::query("DELETE FROM technicians WHERE id = ANY($1::BIGINT[])")
        .bind(ids)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

/// List all active technicians, ordered by name.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_active_technicians(pool: &PgPool) -> Result<Vec<TechnicianRow>, sqlx::Error> {
    sqlx::query_as::<_, TechnicianRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM technicians WHERE is_active = TRUE ORDER BY name ASC"
    ))
    .fetch_all(pool)
    .await
}

/// List every technician, active or not, ordered by name. Used by the
/// roster export.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_all_technicians(pool: &PgPool) -> Result<Vec<TechnicianRow>, sqlx::Error> {
    sqlx::query_as::<_, TechnicianRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM technicians ORDER BY name ASC"
    ))
    .fetch_all(pool)
    .await
}

/// Of the given canonical phone values, return those already on file.
///
/// Lookups run in chunks so one import-sized batch never exceeds a single
/// statement's parameter budget.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if any chunk query fails.
pub async fn find_existing_phones(
    pool: &PgPool,
    phones: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    let mut found = Vec::new();
    for chunk in phones.chunks(LOOKUP_CHUNK_SIZE) {
        let mut rows = sqlx::query_scalar::<_, String>(
            "SELECT phone FROM technicians WHERE phone = ANY($1::TEXT[])",
        )
        .bind(chunk)
        .fetch_all(pool)
        .await?;
        found.append(&mut rows);
    }
    Ok(found)
}

/// Map a unique-violation on the phone index to the user-facing duplicate
/// error; everything else passes through as a database error.
fn classify_insert_error(err: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() && db_err.constraint() == Some("technicians_phone_key") {
            return DbError::DuplicatePhone;
        }
    }
    DbError::Sqlx(err)
}
