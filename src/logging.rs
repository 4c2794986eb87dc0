//! tracing setup shared by the binaries.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Logs go to a daily rolling file when `log_path` is given, to stdout otherwise.
/// Verbosity follows `RUST_LOG`, `info` by default.  Keep the returned guard alive
/// until the program exits, or buffered lines are lost.
pub fn init(log_path: Option<&str>) -> WorkerGuard {
    let (non_blocking, guard) = match log_path {
        Some(path) => {
            let path = Path::new(path);
            let dir_name = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "mongo_migrate.log".to_string());
            let file_appender = tracing_appender::rolling::daily(dir_name, file_name);
            tracing_appender::non_blocking(file_appender)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .init();
    guard
}
