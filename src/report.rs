//! Outcome of one replication run.

use crate::error::{CollectionError, MigrateError};
use chrono::{DateTime, Local};
use std::fmt;
use uuid::Uuid;

/// Exit code for a run which copied everything it considered.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for a fatal error: configuration, connection or enumeration.
pub const EXIT_FATAL: i32 = 1;
/// Exit code for a run where at least one collection failed.
pub const EXIT_PARTIAL: i32 = 2;

/// What happened to one collection.
#[derive(Debug)]
pub enum Outcome {
    /// Destination was cleared and this many records were written.
    Copied(usize),
    /// Source collection is empty, destination was left untouched.
    SkippedEmpty,
    /// Copy failed, destination may be cleared or partially written.
    Failed(CollectionError),
}

impl Outcome {
    /// Is this outcome a failure?
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Copied(count) => write!(f, "copied {} records", count),
            Outcome::SkippedEmpty => write!(f, "skipped (empty)"),
            Outcome::Failed(e) => write!(f, "FAILED: {}", e),
        }
    }
}

/// One report line.
#[derive(Debug)]
pub struct CollectionReport {
    /// collection name.
    pub name: String,
    /// what happened to it.
    pub outcome: Outcome,
}

/// Overall status of a run which got past connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every collection was copied or skipped.
    Succeeded,
    /// At least one collection failed.
    PartiallyFailed,
}

/// Per collection outcome of a replication run, in processing order.
#[derive(Debug)]
pub struct Report {
    run_id: Uuid,
    source_db: String,
    destination_db: String,
    started_at: DateTime<Local>,
    finished_at: Option<DateTime<Local>>,
    collections: Vec<CollectionReport>,
    warnings: Vec<String>,
}

impl Report {
    /// Start a new report, stamped with a fresh run id and the current time.
    pub fn new(source_db: &str, destination_db: &str) -> Report {
        Report {
            run_id: Uuid::new_v4(),
            source_db: source_db.to_string(),
            destination_db: destination_db.to_string(),
            started_at: Local::now(),
            finished_at: None,
            collections: vec![],
            warnings: vec![],
        }
    }

    pub(crate) fn push(&mut self, name: String, outcome: Outcome) {
        self.collections.push(CollectionReport { name, outcome });
    }

    pub(crate) fn warn(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    /// get run id.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// get run start time.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// get run finish time, None while the run is still going.
    pub fn finished_at(&self) -> Option<DateTime<Local>> {
        self.finished_at
    }

    /// get every collection outcome, in processing order.
    pub fn collections(&self) -> &[CollectionReport] {
        &self.collections
    }

    /// get outcome of collection `name`.
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.collections
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.outcome)
    }

    /// get warnings raised while running.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// get overall status.
    pub fn status(&self) -> RunStatus {
        if self.collections.iter().any(|c| c.outcome.is_failed()) {
            RunStatus::PartiallyFailed
        } else {
            RunStatus::Succeeded
        }
    }

    /// Is every collection copied or skipped?
    pub fn is_success(&self) -> bool {
        self.status() == RunStatus::Succeeded
    }

    /// Total number of records written.
    pub fn copied_records(&self) -> usize {
        self.collections
            .iter()
            .map(|c| match c.outcome {
                Outcome::Copied(count) => count,
                _ => 0,
            })
            .sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run {}: {} -> {}, {} collections considered",
            self.run_id,
            self.source_db,
            self.destination_db,
            self.collections.len()
        )?;
        for warning in self.warnings.iter() {
            writeln!(f, "  warning: {}", warning)?;
        }
        for coll in self.collections.iter() {
            writeln!(f, "  {}: {}", coll.name, coll.outcome)?;
        }
        let status = match self.status() {
            RunStatus::Succeeded => "succeeded",
            RunStatus::PartiallyFailed => "partially failed",
        };
        write!(
            f,
            "Status: {}, {} records copied",
            status,
            self.copied_records()
        )?;
        if let Some(finished_at) = self.finished_at {
            let elapsed = finished_at - self.started_at;
            write!(f, " in {:.3}s", elapsed.num_milliseconds() as f64 / 1000.0)?;
        }
        Ok(())
    }
}

/// Map a run result to the process exit code.
///
/// A partially failed run only exits 0 when the caller `tolerate_partial`.
pub fn exit_code(result: &Result<Report, MigrateError>, tolerate_partial: bool) -> i32 {
    match result {
        Err(_) => EXIT_FATAL,
        Ok(report) if report.is_success() || tolerate_partial => EXIT_SUCCESS,
        Ok(_) => EXIT_PARTIAL,
    }
}
