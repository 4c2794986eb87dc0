use chrono::Local;
use clap::Parser;
use mongo_migrate::{logging, seed_database, MigrateConf, MongoConnection};
use std::path::PathBuf;
use tracing::info;

/// Replace users, patients and canteen_sales of a database with sample records.
#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    /// configuration file path.
    #[clap(short, long)]
    conf: Option<PathBuf>,
    /// database uri, its default database is seeded.  Falls back to MONGO_URI.
    #[clap(short, long)]
    target_uri: Option<String>,
    /// CA bundle tried first for TLS.
    #[clap(long)]
    tls_ca_file: Option<PathBuf>,
    /// how many canteen sales to generate.
    #[clap(long)]
    sales_count: Option<usize>,
    /// log file path, if not specified, all log information will be output to stdout.
    #[clap(long)]
    log_path: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let opts: Opts = Opts::parse();
    let _guard = logging::init(opts.log_path.as_deref());

    let mut conf = match &opts.conf {
        Some(path) => MigrateConf::from_file(path)?,
        None => MigrateConf::default(),
    };
    conf.fill_from_env(|k| std::env::var(k).ok());
    conf.override_dst(opts.target_uri, opts.tls_ca_file);
    let mut seed_conf = conf.seed_conf().clone();
    if let Some(sales_count) = opts.sales_count {
        seed_conf = seed_conf.with_sales_count(sales_count);
    }
    // fail on a missing hash before touching the database.
    seed_conf.get_password_hash()?;

    let conn = MongoConnection::connect_destination(&conf)?;
    let summary = seed_database(&conn, &seed_conf, Local::now(), &mut rand::thread_rng())?;
    info!(?summary, "Seed complete.");
    println!(
        "Inserted {} users, {} patients, {} canteen sales records.",
        summary.users, summary.patients, summary.canteen_sales
    );
    Ok(())
}
