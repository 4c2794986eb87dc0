//! provide mongo migrate blocking apis.
mod connection;
#[doc(hidden)]
pub mod replicator;
pub mod strategy;
pub mod uri_helper;

pub use connection::MongoConnection;
pub use replicator::{replicate, Replicator};
pub use strategy::ConnectStrategy;
