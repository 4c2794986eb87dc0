//! Mongo migrate lib, which copies every collection of one mongodb database into another,
//! and seeds sample data for the hospital management application.
//!
//! Provides one replicator: [Replicator], which works against any [Connection].
//! [MongoConnection] talks to mongodb, [MemoryStore] keeps everything in memory.
//!
//! **Replication is destructive**: every non-empty source collection replaces the
//! destination collection with the same name, there is no merge and no rollback.
//!
//! # Replicator example:
//! ```no_run
//! use mongo_migrate::{MigrateConf, MongoConnection, Replicator};
//!
//! let mut conf = MigrateConf::default();
//! conf.fill_from_env(|k| std::env::var(k).ok());
//! let (source, destination) = MongoConnection::connect_pair(&conf).unwrap();
//! let replicator = Replicator::new(source, destination, conf.replicate_conf().clone());
//! let report = replicator.replicate().unwrap();
//! println!("{}", report);
//! ```
//!
//! # Memory example:
//! ```
//! use bson::doc;
//! use mongo_migrate::{replicate, MemoryStore, Outcome, ReplicateConf};
//!
//! let source = MemoryStore::new("local");
//! source.insert_collection("patients", vec![doc! {"_id": 1, "name": "Ali Khan"}]);
//! source.create_collection("system.views");
//! let destination = MemoryStore::new("remote");
//!
//! let report = replicate(&source, &destination, ReplicateConf::default()).unwrap();
//! assert!(matches!(report.outcome("patients"), Some(Outcome::Copied(1))));
//! assert!(report.outcome("system.views").is_none());
//! ```

#![warn(missing_docs)]

#[doc(hidden)]
pub mod blocking;
mod config;
mod error;
pub mod logging;
mod memory;
mod report;
pub mod seed;
mod store;

/// identity key of a record.
const ID_KEY: &str = "_id";
/// mongodb internal collections start with this.
const SYSTEM_COLL_PREFIX: &str = "system.";
/// how many records are written per insert call by default.
const DEFAULT_BATCH_SIZE: usize = 10000;

pub use blocking::{replicate, ConnectStrategy, MongoConnection, Replicator};
pub use config::{
    MigrateConf, ReplicateConf, SeedConf, TimeoutConf, DST_URI_ENV, PASSWORD_HASH_ENV,
};
pub use error::{CollectionError, MigrateError, Result, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use report::{
    exit_code, CollectionReport, Outcome, Report, RunStatus, EXIT_FATAL, EXIT_PARTIAL,
    EXIT_SUCCESS,
};
pub use seed::{seed_database, SeedSummary};
pub use store::{Connection, StoreOp};
