use super::full::{copy_one, Deadline};
use crate::config::ReplicateConf;
use crate::error::{MigrateError, Result};
use crate::report::{Outcome, Report};
use crate::store::Connection;
use crossbeam::channel;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

/// Copy every collection of `source` into `destination`, see [Replicator::replicate].
pub fn replicate<S: Connection, D: Connection>(
    source: S,
    destination: D,
    conf: ReplicateConf,
) -> Result<Report> {
    Replicator::new(source, destination, conf).replicate()
}

/// Destructive full copy of one database into another.
///
/// **Every non-empty source collection replaces the destination collection of the same
/// name.**  Records that existed in destination are deleted and can't be recovered
/// without a backup.
pub struct Replicator<S, D> {
    source: S,
    destination: D,
    conf: ReplicateConf,
}

impl<S: Connection, D: Connection> Replicator<S, D> {
    /// Create a replicator over two opened connections.
    pub fn new(source: S, destination: D, conf: ReplicateConf) -> Replicator<S, D> {
        Replicator {
            source,
            destination,
            conf,
        }
    }

    /// Run the copy.
    ///
    /// Only failing to list source collections is fatal.  A collection whose read,
    /// clear or write fails is reported as [Outcome::Failed] and the run goes on with
    /// the next one.
    pub fn replicate(&self) -> Result<Report> {
        let mut report = Report::new(self.source.db_name(), self.destination.db_name());
        info!(
            run_id = %report.run_id(),
            src_db = self.source.db_name(),
            dst_db = self.destination.db_name(),
            "Begin to replicate database."
        );
        let deadline = Deadline::after(self.conf.get_run_deadline());

        let coll_names = self.collections_to_copy(&mut report)?;
        info!(total = coll_names.len(), ?coll_names, "Found collections to copy.");

        let workers = self.conf.get_collection_concurrent().min(coll_names.len());
        let outcomes = if workers <= 1 {
            self.copy_serial(&coll_names, &deadline)
        } else {
            self.copy_concurrent(&coll_names, workers, &deadline)?
        };
        for (name, outcome) in coll_names.into_iter().zip(outcomes) {
            report.push(name, outcome);
        }
        report.finish();

        info!(
            run_id = %report.run_id(),
            status = ?report.status(),
            copied = report.copied_records(),
            "Replication finished."
        );
        Ok(report)
    }

    /// Source collection names minus reserved ones, in enumeration order.
    fn collections_to_copy(&self, report: &mut Report) -> Result<Vec<String>> {
        let db = self.source.db_name();
        let names = self
            .source
            .list_collection_names()
            .map_err(|source| MigrateError::Enumeration {
                db: db.to_string(),
                source,
            })?;
        if names.is_empty() {
            warn!(%db, "Source database has no collections.");
            report.warn(format!("source database {:?} has no collections", db));
        }

        let wanted = self.conf.get_colls();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            if self.conf.is_reserved(&name) {
                debug!(coll = %name, "Skip reserved collection.");
                continue;
            }
            if let Some(wanted) = wanted {
                if !wanted.contains(&name) {
                    debug!(coll = %name, "Skip collection which is not requested.");
                    continue;
                }
            }
            selected.push(name);
        }

        if let Some(wanted) = wanted {
            for coll in wanted.iter().filter(|c| !selected.contains(c)) {
                warn!(%coll, "Requested collection is reserved or missing in source.");
                report.warn(format!(
                    "requested collection {:?} is reserved or missing in source",
                    coll
                ));
            }
        }
        Ok(selected)
    }

    fn copy_serial(&self, coll_names: &[String], deadline: &Deadline) -> Vec<Outcome> {
        let batch_size = self.conf.get_batch_size();
        coll_names
            .iter()
            .map(|coll| copy_one(&self.source, &self.destination, coll, batch_size, deadline))
            .collect()
    }

    /// Copy independent collections on a bounded pool, outcomes keep `coll_names` order.
    fn copy_concurrent(
        &self,
        coll_names: &[String],
        workers: usize,
        deadline: &Deadline,
    ) -> Result<Vec<Outcome>> {
        let batch_size = self.conf.get_batch_size();
        let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
        info!(workers, "Copy collections concurrently.");

        let (sender, receiver) = channel::unbounded();
        pool.scope(|s| {
            for (idx, coll) in coll_names.iter().enumerate() {
                let sender = sender.clone();
                s.spawn(move |_| {
                    let outcome =
                        copy_one(&self.source, &self.destination, coll, batch_size, deadline);
                    let _ = sender.send((idx, outcome));
                });
            }
        });
        drop(sender);

        let mut outcomes: Vec<(usize, Outcome)> = receiver.iter().collect();
        outcomes.sort_by_key(|(idx, _)| *idx);
        Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
    }
}
