//! Tabular input handling: delimiter auto-detection, grid extraction, and
//! heuristic header detection.
//!
//! Spreadsheet uploads arrive here already reduced to text; anything that can
//! be split into rows and columns is accepted.

use crate::ImportError;

/// Tab wins when the first line contains one; comma otherwise.
#[must_use]
pub fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

/// Split raw text into a grid of trimmed cells.
///
/// Rows may have differing column counts; short rows are the validator's
/// problem, not a parse error.
///
/// # Errors
///
/// [`ImportError::EmptyInput`] when no rows survive, or
/// [`ImportError::Parse`] on a malformed quoted record.
pub fn parse_grid(text: &str) -> Result<Vec<Vec<String>>, ImportError> {
    let delimiter = detect_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|cell| cell.trim().to_string())
                .collect::<Vec<_>>(),
        );
    }

    if grid.is_empty() {
        return Err(ImportError::EmptyInput);
    }
    Ok(grid)
}

/// Heuristic header check: the row is a header if it carries a
/// case-insensitive "name" cell and either a "city" or a "state" cell.
#[must_use]
pub fn is_header_row(row: &[String]) -> bool {
    let has = |token: &str| {
        row.iter()
            .any(|cell| cell.trim().eq_ignore_ascii_case(token))
    };
    has("name") && (has("city") || has("state"))
}
