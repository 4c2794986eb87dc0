use super::strategy::ConnectStrategy;
use super::uri_helper;
use crate::config::{MigrateConf, TimeoutConf};
use crate::error::{MigrateError, Result, StoreError, StoreResult};
use crate::store::Connection;
use bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind, Result as MongoResult};
use mongodb::options::FindOptions;
use mongodb::sync::{Client, Database};
use std::time::Duration;
use tracing::{info, warn};

/// cursor batch size when reading a whole collection.
const READ_BATCH_SIZE: u32 = 10000;
/// server error code for an operation which exceeded its `maxTimeMS`.
const MAX_TIME_MS_EXPIRED: i32 = 50;

/// A [Connection] backed by a mongodb database.
#[derive(Clone, Debug)]
pub struct MongoConnection {
    client: Client,
    db: Database,
    operation_timeout: Option<Duration>,
}

impl MongoConnection {
    /// Open source and destination databases, in this order.
    ///
    /// The destination uri is validated first, so a missing uri or a missing default
    /// database fails before any server is contacted.
    pub fn connect_pair(conf: &MigrateConf) -> Result<(MongoConnection, MongoConnection)> {
        conf.get_dst_uri()?;
        let source = Self::connect_source(conf)?;
        let destination = Self::connect_destination(conf)?;
        Ok((source, destination))
    }

    /// Open source database `conf.get_src_db()` at `conf.get_src_uri()`.
    ///
    /// The server is asked for its database list, so an unreachable server fails here.
    /// A database missing from that list only raises a warning: it reads as empty.
    pub fn connect_source(conf: &MigrateConf) -> Result<MongoConnection> {
        let uri = conf.get_src_uri();
        let db_name = conf.get_src_db();
        let full_uri = with_timeouts(uri, conf.timeouts());

        let client =
            Client::with_uri_str(&full_uri).map_err(|e| connection_error("source", uri, e))?;
        let db_names = client
            .list_database_names(None, None)
            .map_err(|e| connection_error("source", uri, e))?;
        if !db_names.iter().any(|n| n == db_name) {
            warn!(db = db_name, ?db_names, "Source database does not seem to exist.");
        }
        info!(db = db_name, uri = %uri_helper::redact(uri), "Connected to source database.");

        Ok(MongoConnection {
            db: client.database(db_name),
            client,
            operation_timeout: conf.timeouts().get_operation_timeout(),
        })
    }

    /// Open the default database of `conf.get_dst_uri()`.
    ///
    /// Every [ConnectStrategy] is tried in order until one answers a `ping`.
    pub fn connect_destination(conf: &MigrateConf) -> Result<MongoConnection> {
        let uri = conf.get_dst_uri()?;
        let strategies = ConnectStrategy::for_destination(conf.get_tls_ca_file());

        let mut last_err = None;
        for (idx, strategy) in strategies.iter().enumerate() {
            info!(attempt = idx + 1, %strategy, "Connecting to destination database.");
            match Self::open_destination(uri, strategy, conf.timeouts()) {
                Ok(conn) => {
                    info!(db = conn.db_name(), %strategy, "Connected to destination database.");
                    return Ok(conn);
                }
                Err(e @ MigrateError::Configuration(_)) => return Err(e),
                Err(e) => {
                    warn!(%strategy, error = %e, "Connect to destination database failed.");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            MigrateError::Configuration("no destination connect strategy".to_string())
        }))
    }

    fn open_destination(
        uri: &str,
        strategy: &ConnectStrategy,
        timeouts: &TimeoutConf,
    ) -> Result<MongoConnection> {
        let full_uri = with_timeouts(&strategy.apply(uri), timeouts);
        let client = Client::with_uri_str(&full_uri)
            .map_err(|e| connection_error("destination", uri, e))?;
        let db = client.default_database().ok_or_else(|| {
            MigrateError::Configuration(format!(
                "destination uri {} has no default database",
                uri_helper::redact(uri)
            ))
        })?;
        db.run_command(doc! {"ping": 1}, None)
            .map_err(|e| connection_error("destination", uri, e))?;

        Ok(MongoConnection {
            client,
            db,
            operation_timeout: timeouts.get_operation_timeout(),
        })
    }

    fn store_error(&self, e: MongoError) -> StoreError {
        match self.operation_timeout {
            Some(limit) if is_timeout(&e) => StoreError::Timeout(limit),
            _ => StoreError::MongoError(e),
        }
    }

    /// get underlying mongodb client.
    pub fn get_client(&self) -> &Client {
        &self.client
    }

    /// get underlying database.
    pub fn get_db(&self) -> &Database {
        &self.db
    }
}

impl Connection for MongoConnection {
    fn db_name(&self) -> &str {
        self.db.name()
    }

    fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        self.db
            .list_collection_names(None)
            .map_err(|e| self.store_error(e))
    }

    fn read_all(&self, coll: &str) -> StoreResult<Vec<Document>> {
        let mut options = FindOptions::builder().batch_size(READ_BATCH_SIZE).build();
        options.max_time = self.operation_timeout;
        let cursor = self
            .db
            .collection::<Document>(coll)
            .find(None, options)
            .map_err(|e| self.store_error(e))?;
        cursor
            .collect::<MongoResult<Vec<Document>>>()
            .map_err(|e| self.store_error(e))
    }

    fn clear(&self, coll: &str) -> StoreResult<()> {
        self.db
            .collection::<Document>(coll)
            .drop(None)
            .map_err(|e| self.store_error(e))
    }

    fn write_batch(&self, coll: &str, docs: Vec<Document>) -> StoreResult<()> {
        self.db
            .collection::<Document>(coll)
            .insert_many(docs, None)
            .map(|_| ())
            .map_err(|e| self.store_error(e))
    }
}

fn with_timeouts(uri: &str, timeouts: &TimeoutConf) -> String {
    let mut options = vec![
        (
            "connectTimeoutMS",
            timeouts.get_connect_timeout().as_millis().to_string(),
        ),
        (
            "serverSelectionTimeoutMS",
            timeouts.get_server_selection_timeout().as_millis().to_string(),
        ),
    ];
    // bounds clear and write calls, which take no `maxTimeMS`.
    if let Some(operation_timeout) = timeouts.get_operation_timeout() {
        options.push((
            "socketTimeoutMS",
            operation_timeout.as_millis().to_string(),
        ));
    }
    uri_helper::with_options(uri, &options)
}

/// Did the server give up after `maxTimeMS`, or did the socket time out?
fn is_timeout(e: &MongoError) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Command(err) => err.code == MAX_TIME_MS_EXPIRED,
        ErrorKind::Io(err) => err.kind() == std::io::ErrorKind::TimedOut,
        _ => false,
    }
}

fn connection_error(role: &'static str, uri: &str, e: MongoError) -> MigrateError {
    MigrateError::Connection {
        role,
        uri: uri_helper::redact(uri),
        detail: StoreError::MongoError(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_timeout_is_a_timeout() {
        let e = MongoError::from(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "socket timed out",
        ));
        assert!(is_timeout(&e));

        let e = MongoError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ));
        assert!(!is_timeout(&e));
    }

    #[test]
    fn test_operation_timeout_in_uri() {
        let timeouts: TimeoutConf = toml::from_str("operation_timeout_secs = 2").unwrap();
        assert_eq!(
            with_timeouts("mongodb://h/db", &timeouts),
            "mongodb://h/db?connectTimeoutMS=10000&serverSelectionTimeoutMS=30000&socketTimeoutMS=2000"
        );
        assert_eq!(
            with_timeouts("mongodb://h/db", &TimeoutConf::default()),
            "mongodb://h/db?connectTimeoutMS=10000&serverSelectionTimeoutMS=30000"
        );
    }
}
