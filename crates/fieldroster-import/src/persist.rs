//! Batch persistence with bounded blast radius.
//!
//! Accepted rows go in as fixed-size UNNEST batches. A failed chunk either
//! aborts the run or degrades to per-row inserts depending on
//! [`BatchFailurePolicy`]; per-row failures become skip records, never
//! aborts.

use sqlx::PgPool;

use fieldroster_db::{insert_technician, insert_technicians_batch, DbError, NewTechnician};

use crate::types::{BatchFailurePolicy, ParsedRow, SkipReason, SkippedRow};
use crate::validate::skip_parsed;
use crate::ImportError;

/// An accepted row paired with its insert-shaped record, kept together so a
/// late failure can still be reported against the original row number.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub parsed: ParsedRow,
    pub record: NewTechnician,
}

#[derive(Debug, Default)]
pub struct PersistOutcome {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Insert the given records in chunks.
///
/// # Errors
///
/// Under [`BatchFailurePolicy::AbortAll`], the first chunk failure surfaces
/// as [`ImportError::BatchAborted`] with nothing committed at all; every
/// chunk runs inside one transaction that rolls back on failure. Under
/// [`BatchFailurePolicy::IsolatePerRow`] this function only fails if a
/// per-row retry hits a non-database error path, which it does not; failures
/// land in the outcome's skip list instead.
pub async fn persist_rows(
    pool: &PgPool,
    pending: Vec<PendingRecord>,
    chunk_size: usize,
    policy: BatchFailurePolicy,
) -> Result<PersistOutcome, ImportError> {
    match policy {
        BatchFailurePolicy::AbortAll => persist_all_or_nothing(pool, &pending, chunk_size).await,
        BatchFailurePolicy::IsolatePerRow => persist_isolating(pool, &pending, chunk_size).await,
    }
}

/// Stage every chunk in a single transaction; the first failure drops the
/// transaction, rolling back all previously staged chunks.
async fn persist_all_or_nothing(
    pool: &PgPool,
    pending: &[PendingRecord],
    chunk_size: usize,
) -> Result<PersistOutcome, ImportError> {
    let mut outcome = PersistOutcome::default();
    let total_chunks = pending.len().div_ceil(chunk_size.max(1));

    let mut tx = pool.begin().await?;
    for (chunk_index, chunk) in pending.chunks(chunk_size.max(1)).enumerate() {
        let records: Vec<NewTechnician> = chunk.iter().map(|p| p.record.clone()).collect();
        match insert_technicians_batch(&mut *tx, &records).await {
            Ok(inserted) => {
                outcome.imported += usize::try_from(inserted).unwrap_or(chunk.len());
                tracing::debug!(
                    chunk = chunk_index + 1,
                    of = total_chunks,
                    rows = chunk.len(),
                    "chunk staged"
                );
            }
            Err(err) => return Err(ImportError::BatchAborted(err)),
        }
    }
    tx.commit().await?;

    Ok(outcome)
}

async fn persist_isolating(
    pool: &PgPool,
    pending: &[PendingRecord],
    chunk_size: usize,
) -> Result<PersistOutcome, ImportError> {
    let mut outcome = PersistOutcome::default();
    let total_chunks = pending.len().div_ceil(chunk_size.max(1));

    for (chunk_index, chunk) in pending.chunks(chunk_size.max(1)).enumerate() {
        let records: Vec<NewTechnician> = chunk.iter().map(|p| p.record.clone()).collect();
        match insert_technicians_batch(pool, &records).await {
            Ok(inserted) => {
                outcome.imported += usize::try_from(inserted).unwrap_or(chunk.len());
                tracing::debug!(
                    chunk = chunk_index + 1,
                    of = total_chunks,
                    rows = chunk.len(),
                    "chunk committed"
                );
            }
            Err(err) => {
                tracing::warn!(
                    chunk = chunk_index + 1,
                    error = %err,
                    "chunk insert failed, retrying row by row"
                );
                isolate_chunk(pool, chunk, &mut outcome).await;
            }
        }
    }

    Ok(outcome)
}

/// Retry a failed chunk one row at a time so exactly the bad rows are lost.
async fn isolate_chunk(pool: &PgPool, chunk: &[PendingRecord], outcome: &mut PersistOutcome) {
    for pending in chunk {
        match insert_technician(pool, &pending.record).await {
            Ok(_) => outcome.imported += 1,
            Err(DbError::DuplicatePhone) => {
                outcome
                    .skipped
                    .push(skip_parsed(&pending.parsed, SkipReason::DuplicateInDatabase));
            }
            Err(err) => {
                tracing::warn!(row = pending.parsed.row_number, error = %err, "row insert failed");
                outcome.skipped.push(skip_parsed(
                    &pending.parsed,
                    SkipReason::DatabaseError {
                        message: err.to_string(),
                    },
                ));
            }
        }
    }
}
