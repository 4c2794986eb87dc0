use mongodb::error::Error as MongoError;
use std::result::Result as StdResult;
use std::time::Duration;
use thiserror::Error;

/// Fatal errors, any of them stops the whole run.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Required setting is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Configuration file can't be read.
    #[error("Read configuration file {path:?} failed")]
    ConfigFile {
        /// configuration file path.
        path: String,
        /// underlying io error.
        #[source]
        source: std::io::Error,
    },
    /// Configuration file is not valid toml.
    #[error("Parse configuration failed")]
    ConfigParse(#[from] toml::de::Error),
    /// Can't open source or destination database.
    #[error("Connect to {role} database failed, connection string: {uri:?}, detailed: {detail}")]
    Connection {
        /// `source` or `destination`.
        role: &'static str,
        /// connection string with credentials redacted.
        uri: String,
        /// last driver error.
        detail: StoreError,
    },
    /// Source database is opened, but collection names can't be listed.
    #[error("List collections for database {db:?} failed, detailed: {source}")]
    Enumeration {
        /// database name.
        db: String,
        /// underlying store error.
        source: StoreError,
    },
    /// Worker pool for concurrent collection copying can't be built.
    #[error("Build collection worker pool failed")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    /// Writing fixture records failed.
    #[error("Seed collection {coll:?} failed, detailed: {source}")]
    Seed {
        /// collection name.
        coll: String,
        /// underlying store error.
        source: StoreError,
    },
}

/// Error returned by one call against a [Connection](crate::Connection).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Mongodb driver error.
    #[error("Mongodb error: {0}")]
    MongoError(#[from] MongoError),
    /// A record with the same identity already exists in the collection.
    #[error("Duplicate key {id} in collection {coll:?}")]
    DuplicateKey {
        /// collection name.
        coll: String,
        /// offending identity value.
        id: String,
    },
    /// The store refused the operation.
    #[error("Operation rejected: {0}")]
    Rejected(String),
    /// The store can't be reached at all.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// The call did not complete within the operation timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Error scoped to one collection, recorded in the [Report](crate::Report).
#[derive(Error, Debug)]
pub enum CollectionError {
    /// Reading source records failed.
    #[error("read failed: {0}")]
    Read(#[source] StoreError),
    /// Clearing destination collection failed.
    #[error("clear failed: {0}")]
    Clear(#[source] StoreError),
    /// Writing records failed.
    ///
    /// `written` only counts batches the store acknowledged as a whole.  Mongodb
    /// inserts a batch in order and stops at the first bad record, so records of the
    /// failing batch before that one are left in destination too.
    #[error("write failed, {written} of {total} records acknowledged before the failing batch: {source}")]
    Write {
        /// records of fully acknowledged batches.
        written: usize,
        /// records read from source.
        total: usize,
        /// underlying store error.
        source: StoreError,
    },
    /// The run deadline expired before the collection could be copied, or a read or
    /// clear exceeded the operation timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for fatal run errors.
pub type Result<T> = StdResult<T, MigrateError>;

/// Result type for one store call.
pub type StoreResult<T> = StdResult<T, StoreError>;
