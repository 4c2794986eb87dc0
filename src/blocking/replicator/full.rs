//! Full copy of one collection: read everything, clear destination, write everything.

use crate::error::{CollectionError, StoreError};
use crate::report::Outcome;
use crate::store::Connection;
use bson::Document;
use std::result::Result as StdResult;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Point in time after which no collection copy may start.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    inner: Option<(Instant, Duration)>,
}

impl Deadline {
    /// A deadline `limit` from now, or no deadline at all.
    ///
    /// A `limit` too far away to be represented never expires.
    pub fn after(limit: Option<Duration>) -> Deadline {
        Deadline {
            inner: limit.and_then(|limit| {
                Instant::now()
                    .checked_add(limit)
                    .map(|expire_at| (expire_at, limit))
            }),
        }
    }

    /// Fails with [CollectionError::Timeout] once the deadline is passed.
    pub fn check(&self) -> StdResult<(), CollectionError> {
        match self.inner {
            Some((at, limit)) if Instant::now() >= at => Err(CollectionError::Timeout(limit)),
            _ => Ok(()),
        }
    }
}

/// Copy collection `coll` from `source` to `destination`.
///
/// An empty source collection leaves destination untouched.  Otherwise destination
/// collection is cleared and then written with chunks of `batch_size` records.
/// Errors never escape: they are returned as [Outcome::Failed].
pub fn copy_one<S, D>(
    source: &S,
    destination: &D,
    coll: &str,
    batch_size: usize,
    deadline: &Deadline,
) -> Outcome
where
    S: Connection + ?Sized,
    D: Connection + ?Sized,
{
    info!(%coll, "Processing collection.");
    match try_copy_one(source, destination, coll, batch_size, deadline) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(%coll, error = %e, "Copy collection failed, continue with the next one.");
            Outcome::Failed(e)
        }
    }
}

fn try_copy_one<S, D>(
    source: &S,
    destination: &D,
    coll: &str,
    batch_size: usize,
    deadline: &Deadline,
) -> StdResult<Outcome, CollectionError>
where
    S: Connection + ?Sized,
    D: Connection + ?Sized,
{
    deadline.check()?;
    let docs = source
        .read_all(coll)
        .map_err(|e| timeout_or(e, CollectionError::Read))?;
    if docs.is_empty() {
        info!(%coll, "Collection is empty, skipping.");
        return Ok(Outcome::SkippedEmpty);
    }
    let count = docs.len();
    info!(%coll, count, "Found documents in source.");

    // checked again so an expired run never leaves a cleared collection behind.
    deadline.check()?;
    info!(%coll, db = destination.db_name(), "Clearing destination collection.");
    destination
        .clear(coll)
        .map_err(|e| timeout_or(e, CollectionError::Clear))?;

    info!(%coll, count, "Inserting documents to destination.");
    let written = write_chunked(destination, coll, docs, batch_size)?;
    info!(%coll, written, "Copy collection complete.");
    Ok(Outcome::Copied(written))
}

/// A timed out store call fails the collection with [CollectionError::Timeout].
fn timeout_or(e: StoreError, wrap: fn(StoreError) -> CollectionError) -> CollectionError {
    match e {
        StoreError::Timeout(limit) => CollectionError::Timeout(limit),
        e => wrap(e),
    }
}

/// Write `docs` with at most `batch_size` records per call, stop at first failure.
///
/// Every failure, timeouts included, is a [CollectionError::Write] so the count of
/// acknowledged records is kept.
pub fn write_chunked<D>(
    destination: &D,
    coll: &str,
    docs: Vec<Document>,
    batch_size: usize,
) -> StdResult<usize, CollectionError>
where
    D: Connection + ?Sized,
{
    let total = docs.len();
    let batch_size = batch_size.max(1);
    let mut written = 0;
    let mut remain = docs.into_iter().peekable();
    while remain.peek().is_some() {
        let data_to_write: Vec<Document> = remain.by_ref().take(batch_size).collect();
        let len = data_to_write.len();
        destination
            .write_batch(coll, data_to_write)
            .map_err(|source| CollectionError::Write {
                written,
                total,
                source,
            })?;
        written += len;
    }
    Ok(written)
}
