//! Ordered ways of opening a connection, tried one after another.

use super::uri_helper;
use std::fmt;
use std::path::{Path, PathBuf};

/// One way of opening a mongodb client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStrategy {
    /// Trust only the certificates of this CA bundle file.
    CaBundle(PathBuf),
    /// Use the driver's built-in root certificates.
    DriverDefaults,
}

impl ConnectStrategy {
    /// Strategies for a destination connection, most specific first.
    ///
    /// With a configured CA bundle the list is `[CaBundle, DriverDefaults]`, so a broken
    /// local certificate store doesn't prevent connecting.
    pub fn for_destination(tls_ca_file: Option<&Path>) -> Vec<ConnectStrategy> {
        let mut strategies = vec![];
        if let Some(path) = tls_ca_file {
            strategies.push(ConnectStrategy::CaBundle(path.to_path_buf()));
        }
        strategies.push(ConnectStrategy::DriverDefaults);
        strategies
    }

    /// Rewrite `uri` for this strategy.
    pub fn apply(&self, uri: &str) -> String {
        match self {
            ConnectStrategy::CaBundle(path) => uri_helper::with_options(
                uri,
                &[
                    ("tls", "true".to_string()),
                    ("tlsCAFile", path.display().to_string()),
                ],
            ),
            ConnectStrategy::DriverDefaults => uri.to_string(),
        }
    }
}

impl fmt::Display for ConnectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectStrategy::CaBundle(path) => write!(f, "CA bundle {}", path.display()),
            ConnectStrategy::DriverDefaults => f.write_str("driver default trust store"),
        }
    }
}
