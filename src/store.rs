//! The [Connection] abstraction the replicator and the seeder work against.
//!
//! A connection is bound to one logical database.  It knows nothing about the
//! records it moves: every record is an opaque [Document].

use crate::error::StoreResult;
use bson::Document;
use std::fmt;
use std::sync::Arc;

/// An opened handle to one logical database.
///
/// Implementations must be safe to share between threads, the replicator may copy
/// independent collections concurrently when asked to.
pub trait Connection: Send + Sync {
    /// Name of the logical database this connection points at.
    fn db_name(&self) -> &str;

    /// List collection names, in the store's natural order.
    fn list_collection_names(&self) -> StoreResult<Vec<String>>;

    /// Read every record of collection `coll`.
    ///
    /// A collection which doesn't exist reads as empty.
    fn read_all(&self, coll: &str) -> StoreResult<Vec<Document>>;

    /// Remove every record of collection `coll`.
    ///
    /// Clearing an empty or missing collection is a no-op.
    fn clear(&self, coll: &str) -> StoreResult<()>;

    /// Append `docs` to collection `coll`, identity fields are kept as is.
    fn write_batch(&self, coll: &str, docs: Vec<Document>) -> StoreResult<()>;
}

impl<T: Connection + ?Sized> Connection for &T {
    fn db_name(&self) -> &str {
        (**self).db_name()
    }

    fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        (**self).list_collection_names()
    }

    fn read_all(&self, coll: &str) -> StoreResult<Vec<Document>> {
        (**self).read_all(coll)
    }

    fn clear(&self, coll: &str) -> StoreResult<()> {
        (**self).clear(coll)
    }

    fn write_batch(&self, coll: &str, docs: Vec<Document>) -> StoreResult<()> {
        (**self).write_batch(coll, docs)
    }
}

impl<T: Connection + ?Sized> Connection for Arc<T> {
    fn db_name(&self) -> &str {
        (**self).db_name()
    }

    fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        (**self).list_collection_names()
    }

    fn read_all(&self, coll: &str) -> StoreResult<Vec<Document>> {
        (**self).read_all(coll)
    }

    fn clear(&self, coll: &str) -> StoreResult<()> {
        (**self).clear(coll)
    }

    fn write_batch(&self, coll: &str, docs: Vec<Document>) -> StoreResult<()> {
        (**self).write_batch(coll, docs)
    }
}

/// Kind of call made against a [Connection].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// [Connection::list_collection_names]
    List,
    /// [Connection::read_all]
    Read,
    /// [Connection::clear]
    Clear,
    /// [Connection::write_batch]
    Write,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::List => "list",
            StoreOp::Read => "read",
            StoreOp::Clear => "clear",
            StoreOp::Write => "write",
        };
        f.write_str(name)
    }
}
