//! Transient row shapes and the skip-reason taxonomy.
//!
//! All string→number and string→enum coercion happens at the ingestion
//! boundary, in [`crate::validate`]; everything downstream of a
//! [`ParsedRow`] works with typed fields only. The one exception is the raw
//! latitude/longitude pair, which stays textual until the coordinate
//! resolution chain decides whether it is plausible.

use fieldroster_core::Priority;

/// One accepted input row, pre-persistence.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    /// Raw 1-based row number in the uploaded file (header included in the
    /// numbering), for reporting.
    pub row_number: usize,
    pub name: String,
    /// Canonical `(XXX) XXX-XXXX`, or the raw input preserved as-is when it
    /// did not strip to 10 digits. `None` when the column was blank.
    pub phone: Option<String>,
    /// The normalized 10-digit form when one exists; drives duplicate
    /// detection.
    pub phone_digits: Option<String>,
    pub email: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: Option<String>,
    pub latitude_raw: String,
    pub longitude_raw: String,
    pub service_radius_miles: f64,
    pub specialties: Vec<String>,
    pub priority: Priority,
    pub notes: Option<String>,
}

/// Why a row was routed out of the import, from a fixed taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    RowTooShort,
    MissingName,
    MissingCityState,
    InvalidPhone { digits: usize },
    /// Same normalized phone as an earlier row in this run; carries the
    /// first occurrence's row number.
    DuplicateInFile { first_row: usize },
    DuplicateInDatabase,
    NoCoordinates,
    DatabaseError { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::RowTooShort => write!(f, "row too short"),
            SkipReason::MissingName => write!(f, "missing name"),
            SkipReason::MissingCityState => write!(f, "missing city/state"),
            SkipReason::InvalidPhone { digits } => write!(f, "invalid phone: {digits} digits"),
            SkipReason::DuplicateInFile { first_row } => {
                write!(f, "duplicate phone in file: same as row {first_row}")
            }
            SkipReason::DuplicateInDatabase => write!(f, "duplicate phone in database"),
            SkipReason::NoCoordinates => write!(f, "no coordinates found"),
            SkipReason::DatabaseError { message } => write!(f, "database error: {message}"),
        }
    }
}

/// One rejected input row, with whatever identifying fields were extracted
/// before the failure.
#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub row_number: usize,
    pub name: String,
    pub phone: String,
    /// Best-effort `City, ST`; empty when neither was readable.
    pub city_state: String,
    pub reason: SkipReason,
}

/// What to do with a row no resolution tier could place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedCoordinatePolicy {
    /// Skip the row with reason "no coordinates found".
    Drop,
    /// Persist with the `(0, 0)` sentinel and count it in the report's
    /// without-coordinates bucket. Lossless, so the default.
    #[default]
    KeepWithSentinel,
}

/// What to do when a chunk insert fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchFailurePolicy {
    /// Abort the run on the first chunk error, committing nothing further.
    AbortAll,
    /// Retry the failed chunk row by row so one bad record degrades to one
    /// skip instead of a run abort. Default.
    #[default]
    IsolatePerRow,
}
