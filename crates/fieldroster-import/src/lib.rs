//! Bulk import/reconciliation pipeline: heterogeneous tabular uploads in,
//! validated and geolocated technician records out.
//!
//! The pipeline never aborts on a bad row — every rejection becomes a
//! [`SkippedRow`] with a reason from a fixed taxonomy, and the run reports
//! totals at the end. The only hard failure before persistence is an input
//! with no rows at all.

use thiserror::Error;

pub mod export;
pub mod grid;
pub mod persist;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod types;
pub mod validate;

pub use export::export_roster;
pub use grid::parse_grid;
pub use pipeline::{run_import, ImportOptions};
pub use report::ImportReport;
pub use resolve::{CentroidCache, CoordinateResolver, Resolved, ResolutionSource};
pub use types::{
    BatchFailurePolicy, ParsedRow, SkipReason, SkippedRow, UnresolvedCoordinatePolicy,
};

#[derive(Debug, Error)]
pub enum ImportError {
    /// Unrecoverable file-format failure; aborts before any row is
    /// processed.
    #[error("input contains no data rows")]
    EmptyInput,

    #[error("failed to parse tabular input: {0}")]
    Parse(#[from] csv::Error),

    /// A chunk insert failed while running under the abort-all policy; no
    /// partial commit.
    #[error("batch insert aborted: {0}")]
    BatchAborted(#[source] sqlx::Error),

    #[error(transparent)]
    Db(#[from] fieldroster_db::DbError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
