//! The import pipeline end to end: parse, validate, deduplicate against the
//! store, resolve coordinates, persist, report.

use sqlx::PgPool;

use fieldroster_db::NewTechnician;

use crate::grid::parse_grid;
use crate::persist::{persist_rows, PendingRecord};
use crate::report::ImportReport;
use crate::resolve::{CentroidCache, CoordinateResolver, Resolved};
use crate::types::{BatchFailurePolicy, ParsedRow, SkipReason, UnresolvedCoordinatePolicy};
use crate::validate::{filter_database_duplicates, skip_parsed, validate_rows};
use crate::ImportError;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub on_unresolved: UnresolvedCoordinatePolicy,
    pub on_batch_failure: BatchFailurePolicy,
    /// Rows per UNNEST insert statement.
    pub chunk_size: usize,
    /// Mark imported technicians as newly onboarded, ranking them first in
    /// search results.
    pub mark_new: bool,
    pub created_by: Option<String>,
    /// Run everything except persistence.
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            on_unresolved: UnresolvedCoordinatePolicy::default(),
            on_batch_failure: BatchFailurePolicy::default(),
            chunk_size: 500,
            mark_new: false,
            created_by: None,
            dry_run: false,
        }
    }
}

/// Run a full import over raw delimited text.
///
/// # Errors
///
/// [`ImportError::EmptyInput`] or [`ImportError::Parse`] before any row is
/// processed, [`ImportError::Sqlx`] on lookup failures, and
/// [`ImportError::BatchAborted`] only under the abort-all batch policy.
/// Row-level problems never surface here; they land in the report.
pub async fn run_import(
    pool: &PgPool,
    text: &str,
    options: &ImportOptions,
) -> Result<ImportReport, ImportError> {
    let grid = parse_grid(text)?;

    let validated = validate_rows(&grid);
    let data_rows = grid.len() - usize::from(validated.had_header);
    let mut report = ImportReport::new(data_rows);
    report.add_skipped(validated.skipped);

    let mut skipped = Vec::new();
    let accepted = filter_database_duplicates(pool, validated.parsed, &mut skipped).await?;
    report.add_skipped(skipped);

    let cache = CentroidCache::load(pool, &accepted).await?;
    let resolver = CoordinateResolver::for_import(&cache);
    let pending = resolve_accepted(accepted, &resolver, options, &mut report);

    if options.dry_run {
        report.imported = pending.len();
        tracing::info!(rows = pending.len(), "dry run, skipping persistence");
    } else {
        let outcome =
            persist_rows(pool, pending, options.chunk_size, options.on_batch_failure).await?;
        report.imported = outcome.imported;
        report.add_skipped(outcome.skipped);
    }

    report.finalize();
    tracing::info!(
        total = report.total_rows,
        imported = report.imported,
        skipped = report.skipped.len(),
        "import finished"
    );
    Ok(report)
}

/// Run the resolution chain over every accepted row and apply the
/// unresolved-coordinate policy.
fn resolve_accepted(
    rows: Vec<ParsedRow>,
    resolver: &CoordinateResolver<'_>,
    options: &ImportOptions,
    report: &mut ImportReport,
) -> Vec<PendingRecord> {
    let mut pending = Vec::with_capacity(rows.len());
    for parsed in rows {
        let resolved = resolver.resolve(&parsed);
        if !resolved.is_resolved() {
            match options.on_unresolved {
                UnresolvedCoordinatePolicy::Drop => {
                    report
                        .skipped
                        .push(skip_parsed(&parsed, SkipReason::NoCoordinates));
                    continue;
                }
                UnresolvedCoordinatePolicy::KeepWithSentinel => {
                    report.without_coordinates.push(parsed.row_number);
                }
            }
        }
        let record = build_record(&parsed, &resolved, options);
        pending.push(PendingRecord { parsed, record });
    }
    pending
}

fn build_record(parsed: &ParsedRow, resolved: &Resolved, options: &ImportOptions) -> NewTechnician {
    NewTechnician {
        name: parsed.name.clone(),
        phone: parsed.phone.clone(),
        email: parsed.email.clone(),
        city: parsed.city.clone(),
        state: parsed.state.clone(),
        zip: resolved.zip.clone(),
        latitude: resolved.coordinate.latitude,
        longitude: resolved.coordinate.longitude,
        service_radius_miles: parsed.service_radius_miles,
        specialties: parsed.specialties.clone(),
        priority: parsed.priority,
        notes: parsed.notes.clone(),
        is_new: options.mark_new,
        created_by: options.created_by.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldroster_core::geo::Coordinate;
    use fieldroster_core::Priority;

    fn resolve_text(
        text: &str,
        cache: &CentroidCache,
        options: &ImportOptions,
    ) -> (Vec<PendingRecord>, ImportReport) {
        let grid = parse_grid(text).unwrap();
        let validated = validate_rows(&grid);
        let mut report = ImportReport::new(grid.len() - usize::from(validated.had_header));
        report.add_skipped(validated.skipped);
        let resolver = CoordinateResolver::for_import(cache);
        let pending = resolve_accepted(validated.parsed, &resolver, options, &mut report);
        report.finalize();
        (pending, report)
    }

    #[test]
    fn three_row_mixed_file_accepts_two_and_skips_the_nameless_one() {
        // One ZIP-only row, one row with out-of-range coordinates that falls
        // back to its ZIP, one row with no name.
        let text = "name,phone,email,city,state,zip,latitude,longitude\n\
                    Jo Rivera,,,Dallas,TX,75201,,\n\
                    Sam Ortiz,,,Austin,TX,78701,98.6,10.0\n\
                    ,,,Waco,TX,76701,,\n";
        let mut cache = CentroidCache::new();
        cache.insert_zip("75201", Coordinate::new(32.78, -96.80));
        cache.insert_zip("78701", Coordinate::new(30.27, -97.74));

        let (pending, report) = resolve_text(text, &cache, &ImportOptions::default());
        assert_eq!(pending.len(), 2);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::MissingName);
        assert!(pending.iter().all(|p| p.record.latitude > 18.0));
    }

    #[test]
    fn reformatted_duplicate_phone_is_skipped_against_the_first() {
        let text = "Jo Rivera,555-123-4567,,Dallas,TX\n\
                    Sam Ortiz,(555) 123-4567,,Austin,TX\n";
        let cache = CentroidCache::new();
        let (pending, report) = resolve_text(text, &cache, &ImportOptions::default());
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].parsed.name, "Jo Rivera");
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::DuplicateInFile { first_row: 1 }
        );
    }

    #[test]
    fn drop_policy_skips_unplaceable_rows() {
        let text = "Jo Rivera,,,Smallville,KS\n";
        let cache = CentroidCache::new();
        let options = ImportOptions {
            on_unresolved: UnresolvedCoordinatePolicy::Drop,
            ..ImportOptions::default()
        };
        let (pending, report) = resolve_text(text, &cache, &options);
        assert!(pending.is_empty());
        assert_eq!(report.skipped[0].reason, SkipReason::NoCoordinates);
        assert!(report.without_coordinates.is_empty());
    }

    #[test]
    fn sentinel_policy_keeps_unplaceable_rows_and_counts_them() {
        let text = "Jo Rivera,,,Smallville,KS\n";
        let cache = CentroidCache::new();
        let (pending, report) = resolve_text(text, &cache, &ImportOptions::default());
        assert_eq!(pending.len(), 1);
        assert!((pending[0].record.latitude).abs() < f64::EPSILON);
        assert!((pending[0].record.longitude).abs() < f64::EPSILON);
        assert_eq!(report.without_coordinates, vec![1]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn export_round_trips_through_validation() {
        use chrono::Utc;
        use fieldroster_core::Technician;
        use uuid::Uuid;

        let original = Technician {
            id: 1,
            public_id: Uuid::nil(),
            name: "Jo Rivera".to_string(),
            phone: Some("(555) 123-4567".to_string()),
            email: Some("jo@example.com".to_string()),
            city: "Dallas".to_string(),
            state: "TX".to_string(),
            zip: Some("75201".to_string()),
            latitude: 32.7767,
            longitude: -96.797,
            service_radius_miles: 40.0,
            specialties: vec!["hvac".to_string()],
            priority: Priority::Best,
            notes: Some("after hours ok".to_string()),
            is_active: true,
            is_new: false,
            created_by: None,
            created_at: Utc::now(),
        };

        let exported = crate::export::export_roster(std::slice::from_ref(&original));
        let cache = CentroidCache::new();
        let (pending, report) = resolve_text(&exported, &cache, &ImportOptions::default());

        assert!(report.skipped.is_empty());
        assert_eq!(pending.len(), 1);
        let rec = &pending[0].record;
        assert_eq!(rec.name, original.name);
        assert_eq!(rec.phone, original.phone);
        assert_eq!(rec.city, original.city);
        assert_eq!(rec.state, original.state);
        assert_eq!(rec.zip, original.zip);
        assert!((rec.latitude - original.latitude).abs() < 1e-9);
        assert!((rec.longitude - original.longitude).abs() < 1e-9);
        assert!((rec.service_radius_miles - 40.0).abs() < f64::EPSILON);
        assert_eq!(rec.specialties, original.specialties);
        assert_eq!(rec.priority, Priority::Best);
        assert_eq!(rec.notes, original.notes);
    }

    #[test]
    fn created_by_and_mark_new_flow_into_records() {
        let text = "Jo Rivera,,,Dallas,TX,75201\n";
        let mut cache = CentroidCache::new();
        cache.insert_zip("75201", Coordinate::new(32.78, -96.80));
        let options = ImportOptions {
            mark_new: true,
            created_by: Some("ops".to_string()),
            ..ImportOptions::default()
        };
        let (pending, _) = resolve_text(text, &cache, &options);
        assert!(pending[0].record.is_new);
        assert_eq!(pending[0].record.created_by.as_deref(), Some("ops"));
    }
}
