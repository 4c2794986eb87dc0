use clap::Parser;
use mongo_migrate::{exit_code, logging, MigrateConf, MongoConnection, Replicator, Report, Result};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Copy every collection of a mongodb database to a remote replica.
///
/// DESTRUCTIVE: each destination collection with a non-empty source counterpart is
/// dropped and rewritten.  Take a backup of the destination first.
#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    /// configuration file path.
    #[clap(short, long)]
    conf: Option<PathBuf>,
    /// source database uri.
    #[clap(short, long)]
    src_uri: Option<String>,
    /// source database name.
    #[clap(short, long)]
    db: Option<String>,
    /// destination uri, its default database is written to.  Falls back to MONGO_URI.
    #[clap(short, long)]
    target_uri: Option<String>,
    /// CA bundle tried first for destination TLS.
    #[clap(long)]
    tls_ca_file: Option<PathBuf>,
    /// only copy these collections, can be given several times.
    #[clap(long)]
    colls: Option<Vec<String>>,
    /// how many collections are copied at the same time, 0 means number of cpus.
    #[clap(long)]
    collection_concurrent: Option<usize>,
    /// how many records are written per insert call.
    #[clap(long)]
    batch_size: Option<usize>,
    /// exit with 0 even when some collections failed.
    #[clap(long)]
    tolerate_partial: bool,
    /// log file path, if not specified, all log information will be output to stdout.
    #[clap(long)]
    log_path: Option<String>,
}

fn main() {
    dotenvy::dotenv().ok();
    let opts: Opts = Opts::parse();
    let guard = logging::init(opts.log_path.as_deref());
    let tolerate_partial = opts.tolerate_partial;

    let result = run(opts);
    match &result {
        Ok(report) => {
            println!("{}", report);
            if !report.is_success() {
                warn!(tolerate_partial, "Some collections failed, re-run to retry them.");
            }
        }
        Err(e) => error!(error = %e, "Migration aborted."),
    }

    let code = exit_code(&result, tolerate_partial);
    drop(guard);
    std::process::exit(code);
}

fn run(opts: Opts) -> Result<Report> {
    let mut conf = match &opts.conf {
        Some(path) => MigrateConf::from_file(path)?,
        None => MigrateConf::default(),
    };
    conf.fill_from_env(|k| std::env::var(k).ok());
    conf.override_src(opts.src_uri, opts.db);
    conf.override_dst(opts.target_uri, opts.tls_ca_file);

    let mut replicate_conf = conf.replicate_conf().clone();
    if let Some(colls) = opts.colls {
        replicate_conf = replicate_conf.with_colls(colls);
    }
    if let Some(concurrent) = opts.collection_concurrent {
        replicate_conf = replicate_conf.with_collection_concurrent(concurrent);
    }
    if let Some(batch_size) = opts.batch_size {
        replicate_conf = replicate_conf.with_batch_size(batch_size);
    }

    info!(
        db = conf.get_src_db(),
        "Starting data migration from local mongodb to remote replica."
    );
    warn!("Destination collections with a non-empty source counterpart will be dropped and rewritten.");

    let (source, destination) = MongoConnection::connect_pair(&conf)?;
    Replicator::new(source, destination, replicate_conf).replicate()
}
