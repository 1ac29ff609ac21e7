//! In-process [`WorkStore`] with store-assigned resource versions

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use super::{WorkKey, WorkRecord, WorkStore};
use crate::crd::ManifestWorkStatus;
use crate::{Error, Result};

/// Versioned in-memory work store
///
/// Resource versions come from a single counter shared by all records, the
/// way an API server hands out revisions. A status write compares the
/// submitted version with the stored one under the entry's lock, so racing
/// writers see exactly one winner.
#[derive(Debug, Default)]
pub struct InMemoryWorkStore {
    records: DashMap<WorkKey, WorkRecord>,
    revision: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryWorkStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> String {
        (self.revision.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Admit a work with the given status, replacing any existing one
    pub fn insert(&self, key: WorkKey, status: ManifestWorkStatus) -> WorkRecord {
        let record = WorkRecord {
            key: key.clone(),
            status,
            resource_version: self.next_version(),
        };
        self.records.insert(key, record.clone());
        record
    }

    /// Withdraw a work. Returns true if it existed.
    pub fn remove(&self, key: &WorkKey) -> bool {
        self.records.remove(key).is_some()
    }

    /// Number of successful status writes since creation
    pub fn status_writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkStore for InMemoryWorkStore {
    async fn get(&self, key: &WorkKey) -> Result<WorkRecord> {
        self.records
            .get(key)
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn update_status(&self, record: &WorkRecord) -> Result<WorkRecord> {
        let mut stored = self
            .records
            .get_mut(&record.key)
            .ok_or_else(|| Error::NotFound(record.key.to_string()))?;

        if stored.resource_version != record.resource_version {
            trace!(
                work = %record.key,
                stored = %stored.resource_version,
                submitted = %record.resource_version,
                "Rejecting stale status write"
            );
            return Err(Error::Conflict(record.key.to_string()));
        }

        stored.status = record.status.clone();
        stored.resource_version = self.next_version();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored.clone())
    }
}
