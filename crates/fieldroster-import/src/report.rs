//! End-of-run aggregation. Pure; no I/O beyond what it is handed.

use std::collections::BTreeMap;

use crate::types::SkippedRow;

/// Totals and the skip list for one import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Data rows seen (header excluded).
    pub total_rows: usize,
    pub imported: usize,
    /// Sorted ascending by row number.
    pub skipped: Vec<SkippedRow>,
    /// Rows persisted with the `(0, 0)` sentinel under the lenient
    /// unresolved-coordinate policy, by row number.
    pub without_coordinates: Vec<usize>,
}

impl ImportReport {
    #[must_use]
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }

    pub fn add_skipped(&mut self, rows: impl IntoIterator<Item = SkippedRow>) {
        self.skipped.extend(rows);
    }

    /// Order the skip list for display. Call once, after the last skip is in.
    pub fn finalize(&mut self) {
        self.skipped.sort_by_key(|s| s.row_number);
    }

    /// Count-by-reason breakdown. `BTreeMap` keeps summary lines in a stable
    /// order.
    #[must_use]
    pub fn reason_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.skipped {
            *counts.entry(row.reason.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// The skipped rows as a 5-column delimited file.
    #[must_use]
    pub fn skipped_export(&self) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        // Header writes into an in-memory buffer; csv only fails on I/O.
        let _ = writer.write_record(["Row #", "Name", "Phone", "City/State", "Reason"]);
        for row in &self.skipped {
            let _ = writer.write_record([
                row.row_number.to_string(),
                row.name.clone(),
                row.phone.clone(),
                row.city_state.clone(),
                row.reason.to_string(),
            ]);
        }
        let bytes = writer.into_inner().unwrap_or_default();
        String::from_utf8(bytes).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkipReason;

    fn skipped(row_number: usize, reason: SkipReason) -> SkippedRow {
        SkippedRow {
            row_number,
            name: format!("Tech {row_number}"),
            phone: String::new(),
            city_state: "Dallas, TX".to_string(),
            reason,
        }
    }

    #[test]
    fn finalize_sorts_by_row_number() {
        let mut report = ImportReport::new(5);
        report.add_skipped([
            skipped(9, SkipReason::MissingName),
            skipped(2, SkipReason::RowTooShort),
            skipped(5, SkipReason::MissingName),
        ]);
        report.finalize();
        let order: Vec<usize> = report.skipped.iter().map(|s| s.row_number).collect();
        assert_eq!(order, vec![2, 5, 9]);
    }

    #[test]
    fn reason_counts_aggregate() {
        let mut report = ImportReport::new(4);
        report.add_skipped([
            skipped(1, SkipReason::MissingName),
            skipped(2, SkipReason::MissingName),
            skipped(3, SkipReason::DuplicateInFile { first_row: 1 }),
        ]);
        let counts = report.reason_counts();
        assert_eq!(counts.get("missing name"), Some(&2));
        assert_eq!(
            counts.get("duplicate phone in file: same as row 1"),
            Some(&1)
        );
    }

    #[test]
    fn export_has_header_and_quotes_embedded_commas() {
        let mut report = ImportReport::new(1);
        report.add_skipped([SkippedRow {
            row_number: 3,
            name: "Rivera, Jo".to_string(),
            phone: "555-123-4567".to_string(),
            city_state: "Dallas, TX".to_string(),
            reason: SkipReason::MissingCityState,
        }]);
        report.finalize();

        let out = report.skipped_export();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Row #,Name,Phone,City/State,Reason"));
        assert_eq!(
            lines.next(),
            Some("3,\"Rivera, Jo\",555-123-4567,\"Dallas, TX\",missing city/state")
        );
    }

    #[test]
    fn empty_report_exports_header_only() {
        let report = ImportReport::new(0);
        assert_eq!(report.skipped_export(), "Row #,Name,Phone,City/State,Reason\n");
    }
}
