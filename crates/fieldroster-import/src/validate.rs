//! Row validation: field-level checks, intra-file duplicate detection, and
//! the global duplicate-against-database check.
//!
//! Validation never fails — every row is routed to exactly one of the two
//! output lists.

use std::collections::HashMap;

use sqlx::PgPool;

use fieldroster_core::{normalize, Priority, DEFAULT_SERVICE_RADIUS_MILES};

use crate::grid::is_header_row;
use crate::types::{ParsedRow, SkipReason, SkippedRow};

/// Expected column layout. Only the first five are required.
const COL_NAME: usize = 0;
const COL_PHONE: usize = 1;
const COL_EMAIL: usize = 2;
const COL_CITY: usize = 3;
const COL_STATE: usize = 4;
const COL_ZIP: usize = 5;
const COL_LATITUDE: usize = 6;
const COL_LONGITUDE: usize = 7;
const COL_RADIUS: usize = 8;
const COL_SPECIALTIES: usize = 9;
const COL_PRIORITY: usize = 10;
const COL_NOTES: usize = 11;

const MIN_COLUMNS: usize = 5;

#[derive(Debug, Default)]
pub struct Validated {
    pub parsed: Vec<ParsedRow>,
    pub skipped: Vec<SkippedRow>,
    /// Whether the first row was consumed as a header.
    pub had_header: bool,
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map_or("", |s| s.trim())
}

fn opt_cell(row: &[String], idx: usize) -> Option<String> {
    let value = cell(row, idx);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Run every field-level check over the grid.
///
/// Row numbers are raw 1-based positions in the uploaded file, header
/// included, so a reported skip points at the line the uploader sees in
/// their editor.
#[must_use]
pub fn validate_rows(grid: &[Vec<String>]) -> Validated {
    let mut out = Validated::default();

    let had_header = grid.first().is_some_and(|row| is_header_row(row));
    out.had_header = had_header;
    let data_start = usize::from(had_header);

    // Normalized 10-digit phone -> first row number that used it.
    let mut seen_phones: HashMap<String, usize> = HashMap::new();

    for (idx, row) in grid.iter().enumerate().skip(data_start) {
        let row_number = idx + 1;
        match validate_row(row, row_number, &mut seen_phones) {
            Ok(parsed) => out.parsed.push(parsed),
            Err(reason) => out.skipped.push(skip(row, row_number, reason)),
        }
    }

    out
}

fn validate_row(
    row: &[String],
    row_number: usize,
    seen_phones: &mut HashMap<String, usize>,
) -> Result<ParsedRow, SkipReason> {
    if row.len() < MIN_COLUMNS {
        return Err(SkipReason::RowTooShort);
    }

    let name = cell(row, COL_NAME);
    if name.is_empty() {
        return Err(SkipReason::MissingName);
    }

    let city_raw = cell(row, COL_CITY);
    let state_raw = cell(row, COL_STATE);
    if city_raw.is_empty() || state_raw.is_empty() {
        return Err(SkipReason::MissingCityState);
    }
    let city = normalize::correct_city(city_raw);
    let state = normalize::correct_state(state_raw);

    let phone_raw = cell(row, COL_PHONE);
    let mut phone_digits = None;
    if !phone_raw.is_empty() {
        let digits = normalize::strip_phone(phone_raw);
        if !digits.is_empty() && digits.len() != 10 {
            return Err(SkipReason::InvalidPhone {
                digits: digits.len(),
            });
        }
        if digits.len() == 10 {
            if let Some(&first_row) = seen_phones.get(&digits) {
                return Err(SkipReason::DuplicateInFile { first_row });
            }
            seen_phones.insert(digits.clone(), row_number);
            phone_digits = Some(digits);
        }
    }
    let phone = if phone_raw.is_empty() {
        None
    } else {
        Some(normalize::format_phone(phone_raw))
    };

    let service_radius_miles = cell(row, COL_RADIUS)
        .parse::<f64>()
        .ok()
        .filter(|r| *r > 0.0)
        .unwrap_or(DEFAULT_SERVICE_RADIUS_MILES);

    let specialties: Vec<String> = cell(row, COL_SPECIALTIES)
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    let priority = Priority::parse_or_default(cell(row, COL_PRIORITY));

    Ok(ParsedRow {
        row_number,
        name: name.to_string(),
        phone,
        phone_digits,
        email: opt_cell(row, COL_EMAIL),
        city,
        state,
        zip: opt_cell(row, COL_ZIP),
        latitude_raw: cell(row, COL_LATITUDE).to_string(),
        longitude_raw: cell(row, COL_LONGITUDE).to_string(),
        service_radius_miles,
        specialties,
        priority,
        notes: opt_cell(row, COL_NOTES),
    })
}

fn skip(row: &[String], row_number: usize, reason: SkipReason) -> SkippedRow {
    let city = cell(row, COL_CITY);
    let state = cell(row, COL_STATE);
    let city_state = match (city.is_empty(), state.is_empty()) {
        (false, false) => format!("{city}, {state}"),
        (false, true) => city.to_string(),
        (true, false) => state.to_string(),
        (true, true) => String::new(),
    };

    SkippedRow {
        row_number,
        name: cell(row, COL_NAME).to_string(),
        phone: cell(row, COL_PHONE).to_string(),
        city_state,
        reason,
    }
}

/// Build a [`SkippedRow`] from an accepted row that fails later in the
/// pipeline (database duplicate, unresolved coordinates, insert failure).
#[must_use]
pub fn skip_parsed(parsed: &ParsedRow, reason: SkipReason) -> SkippedRow {
    SkippedRow {
        row_number: parsed.row_number,
        name: parsed.name.clone(),
        phone: parsed.phone.clone().unwrap_or_default(),
        city_state: format!("{}, {}", parsed.city, parsed.state),
        reason,
    }
}

/// Remove accepted rows whose normalized phone is already on file.
///
/// One batched query covers the whole run; hits are routed to the skip list
/// with the duplicate-in-database reason.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the phone lookup fails.
pub async fn filter_database_duplicates(
    pool: &PgPool,
    parsed: Vec<ParsedRow>,
    skipped: &mut Vec<SkippedRow>,
) -> Result<Vec<ParsedRow>, sqlx::Error> {
    let candidate_phones: Vec<String> = parsed
        .iter()
        .filter(|p| p.phone_digits.is_some())
        .filter_map(|p| p.phone.clone())
        .collect();

    if candidate_phones.is_empty() {
        return Ok(parsed);
    }

    let existing = fieldroster_db::find_existing_phones(pool, &candidate_phones).await?;
    if existing.is_empty() {
        return Ok(parsed);
    }

    let mut kept = Vec::with_capacity(parsed.len());
    for row in parsed {
        let is_dup = row
            .phone
            .as_ref()
            .is_some_and(|p| row.phone_digits.is_some() && existing.contains(p));
        if is_dup {
            tracing::debug!(row = row.row_number, "phone already on file");
            skipped.push(skip_parsed(&row, SkipReason::DuplicateInDatabase));
        } else {
            kept.push(row);
        }
    }
    Ok(kept)
}
