//! In-process [Connection] implementation.
//!
//! [MemoryStore] keeps collections in insertion order, enforces `_id` uniqueness like
//! mongodb does, records every call made against it and can be told to fail chosen
//! calls.  It's what the test-suite replicates from and to.
//!
//! # Example
//! ```
//! use bson::doc;
//! use mongo_migrate::{Connection, MemoryStore, StoreOp};
//!
//! let store = MemoryStore::new("hospital_management");
//! store.insert_collection("users", vec![doc! {"_id": 1, "username": "DrSmith"}]);
//! store.fail_on(StoreOp::Write, "users");
//!
//! assert_eq!(store.read_all("users").unwrap().len(), 1);
//! assert!(store.write_batch("users", vec![doc! {"_id": 2}]).is_err());
//! ```

use crate::error::{StoreError, StoreResult};
use crate::store::{Connection, StoreOp};
use crate::ID_KEY;
use bson::{Bson, Document};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug)]
struct FailPoint {
    op: StoreOp,
    coll: String,
    /// how many matching calls still succeed before failing.
    skip: usize,
    /// fail as a timed out call instead of a rejected one.
    timeout: Option<Duration>,
}

#[derive(Debug, Default)]
struct Inner {
    colls: Vec<(String, Vec<Document>)>,
    fail_points: Vec<FailPoint>,
    operations: Vec<(StoreOp, String)>,
    unavailable: bool,
}

impl Inner {
    fn coll_mut(&mut self, name: &str) -> &mut Vec<Document> {
        let pos = match self.colls.iter().position(|(n, _)| n == name) {
            Some(pos) => pos,
            None => {
                self.colls.push((name.to_string(), vec![]));
                self.colls.len() - 1
            }
        };
        &mut self.colls[pos].1
    }

    fn check(&mut self, op: StoreOp, coll: &str) -> StoreResult<()> {
        self.operations.push((op, coll.to_string()));
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store is switched off".to_string()));
        }
        if let Some(fp) = self
            .fail_points
            .iter_mut()
            .find(|fp| fp.op == op && fp.coll == coll)
        {
            if fp.skip > 0 {
                fp.skip -= 1;
            } else if let Some(limit) = fp.timeout {
                return Err(StoreError::Timeout(limit));
            } else {
                return Err(StoreError::Rejected(format!(
                    "injected {} failure on {:?}",
                    op, coll
                )));
            }
        }
        Ok(())
    }
}

/// A [Connection] which keeps everything in memory.
#[derive(Debug)]
pub struct MemoryStore {
    db_name: String,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store for database `db_name`.
    pub fn new(db_name: impl Into<String>) -> Self {
        MemoryStore {
            db_name: db_name.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `docs` to collection `name`, creating it when missing.
    ///
    /// This is a fixture helper: it's not recorded and never fails.
    pub fn insert_collection(&self, name: &str, docs: Vec<Document>) {
        self.lock().coll_mut(name).extend(docs);
    }

    /// Create collection `name` without records.
    pub fn create_collection(&self, name: &str) {
        self.lock().coll_mut(name);
    }

    /// Records of collection `name`, None when it doesn't exist.
    pub fn collection(&self, name: &str) -> Option<Vec<Document>> {
        self.lock()
            .colls
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, docs)| docs.clone())
    }

    /// Make every call of kind `op` on collection `coll` fail.
    pub fn fail_on(&self, op: StoreOp, coll: &str) {
        self.fail_on_after(op, coll, 0)
    }

    /// Let `skip` calls of kind `op` on `coll` succeed, then fail every following one.
    pub fn fail_on_after(&self, op: StoreOp, coll: &str, skip: usize) {
        self.lock().fail_points.push(FailPoint {
            op,
            coll: coll.to_string(),
            skip,
            timeout: None,
        });
    }

    /// Make every call of kind `op` on collection `coll` time out after `limit`.
    pub fn time_out_on(&self, op: StoreOp, coll: &str, limit: Duration) {
        self.lock().fail_points.push(FailPoint {
            op,
            coll: coll.to_string(),
            skip: 0,
            timeout: Some(limit),
        });
    }

    /// Switch the whole store off (or back on).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Every call made so far, with the collection it targeted.
    ///
    /// [StoreOp::List] calls are recorded with an empty collection name.
    pub fn operations(&self) -> Vec<(StoreOp, String)> {
        self.lock().operations.clone()
    }

    /// Whether any call ever targeted collection `coll`.
    pub fn touched(&self, coll: &str) -> bool {
        self.lock().operations.iter().any(|(_, c)| c == coll)
    }
}

impl Connection for MemoryStore {
    fn db_name(&self) -> &str {
        &self.db_name
    }

    fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        let mut inner = self.lock();
        inner.check(StoreOp::List, "")?;
        Ok(inner.colls.iter().map(|(n, _)| n.clone()).collect())
    }

    fn read_all(&self, coll: &str) -> StoreResult<Vec<Document>> {
        let mut inner = self.lock();
        inner.check(StoreOp::Read, coll)?;
        Ok(inner
            .colls
            .iter()
            .find(|(n, _)| n == coll)
            .map(|(_, docs)| docs.clone())
            .unwrap_or_default())
    }

    fn clear(&self, coll: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.check(StoreOp::Clear, coll)?;
        if let Some((_, docs)) = inner.colls.iter_mut().find(|(n, _)| n == coll) {
            docs.clear();
        }
        Ok(())
    }

    fn write_batch(&self, coll: &str, docs: Vec<Document>) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.check(StoreOp::Write, coll)?;

        // the whole batch is validated first, so a rejected batch leaves nothing behind.
        let target = inner.coll_mut(coll);
        let mut seen: Vec<&Bson> = target.iter().filter_map(|d| d.get(ID_KEY)).collect();
        for doc in docs.iter() {
            if let Some(id) = doc.get(ID_KEY) {
                if seen.contains(&id) {
                    return Err(StoreError::DuplicateKey {
                        coll: coll.to_string(),
                        id: id.to_string(),
                    });
                }
                seen.push(id);
            }
        }
        target.extend(docs);
        Ok(())
    }
}
