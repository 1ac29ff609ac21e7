//! ManifestWork status updates under optimistic concurrency
//!
//! [`StatusUpdater`] runs a fetch → mutate → compare → write cycle against a
//! [`WorkStore`]. The caller's mutation runs on a private copy of the
//! persisted status; if the result is structurally equal to what was fetched
//! nothing is written, otherwise the copy is submitted with the resource
//! version captured at fetch time. A stale version makes the store reject the
//! write with [`Error::Conflict`], and the cycle starts over against the
//! current record until the [`RetryConfig`] gives up.
//!
//! There are no client-side locks: concurrent updaters of the same work race
//! at the store, and the loser retries.

mod kube_store;
mod memory;

pub use kube_store::KubeWorkStore;
pub use memory::InMemoryWorkStore;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::UpdaterConfig;
use crate::crd::ManifestWorkStatus;
use crate::retry::{Backoff, RetryConfig};
use crate::{Error, Result};

/// Namespaced name of a ManifestWork
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkKey {
    /// Namespace of the work (the managed cluster's namespace on the hub)
    pub namespace: String,
    /// Name of the work
    pub name: String,
}

impl WorkKey {
    /// Create a key from namespace and name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for WorkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A ManifestWork's status as persisted in the store
#[derive(Clone, Debug, PartialEq)]
pub struct WorkRecord {
    /// Which work this is
    pub key: WorkKey,
    /// Persisted status
    pub status: ManifestWorkStatus,
    /// Opaque version; changes on every successful write
    pub resource_version: String,
}

/// Versioned storage for ManifestWork status
///
/// This trait allows mocking the store in tests while using the Kubernetes
/// API in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkStore: Send + Sync {
    /// Fetch the current record. Fails with [`Error::NotFound`] if absent.
    async fn get(&self, key: &WorkKey) -> Result<WorkRecord>;

    /// Replace the status of `record.key` if `record.resource_version` is
    /// still current, returning the record with its new version.
    ///
    /// Fails with [`Error::Conflict`] if the version is stale.
    async fn update_status(&self, record: &WorkRecord) -> Result<WorkRecord>;
}

/// Outcome of [`StatusUpdater::update_status`]
#[derive(Clone, Debug, PartialEq)]
pub struct StatusUpdate {
    /// Status as it now stands in the store
    pub status: ManifestWorkStatus,
    /// Whether a write happened
    pub changed: bool,
}

/// Applies status mutations to ManifestWorks with conflict retry
pub struct StatusUpdater {
    store: Arc<dyn WorkStore>,
    retry: RetryConfig,
}

impl StatusUpdater {
    /// Create an updater with the default retry policy
    pub fn new(store: Arc<dyn WorkStore>) -> Self {
        Self::with_retry(store, RetryConfig::default())
    }

    /// Create an updater with an explicit retry policy
    pub fn with_retry(store: Arc<dyn WorkStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// Create an updater from loaded configuration
    pub fn from_config(store: Arc<dyn WorkStore>, config: &UpdaterConfig) -> Self {
        Self::with_retry(store, config.retry.clone())
    }

    /// Apply `mutate` to the current status of `key` and persist the result
    /// if it differs.
    ///
    /// `mutate` may run more than once: after a conflict it is applied again
    /// to the freshly fetched status. It should be a pure function of the
    /// status it is given.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the work does not exist
    /// - whatever `mutate` returns, with no write attempted
    /// - [`Error::RetryExhausted`] if every allowed attempt conflicted
    /// - [`Error::Canceled`] if `cancel` fires before the cycle completes
    #[instrument(skip(self, cancel, mutate), fields(work = %key))]
    pub async fn update_status<F>(
        &self,
        cancel: &CancellationToken,
        key: &WorkKey,
        mut mutate: F,
    ) -> Result<StatusUpdate>
    where
        F: FnMut(&mut ManifestWorkStatus) -> Result<()> + Send,
    {
        let mut backoff = Backoff::new(&self.retry);

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Canceled);
            }

            let record = until_cancelled(cancel, self.store.get(key)).await?;

            let mut status = record.status.clone();
            mutate(&mut status)?;

            if status == record.status {
                debug!(
                    resource_version = %record.resource_version,
                    "Status unchanged, skipping write"
                );
                return Ok(StatusUpdate {
                    status: record.status,
                    changed: false,
                });
            }

            let candidate = WorkRecord { status, ..record };
            match until_cancelled(cancel, self.store.update_status(&candidate)).await {
                Ok(written) => {
                    info!(
                        resource_version = %written.resource_version,
                        conditions = candidate.status.conditions.len(),
                        manifests = candidate.status.manifest_conditions.len(),
                        "Status updated"
                    );
                    return Ok(StatusUpdate {
                        status: candidate.status,
                        changed: true,
                    });
                }
                Err(e) if e.is_conflict() => {
                    let Some(delay) = backoff.next_delay() else {
                        error!(
                            attempts = backoff.attempts(),
                            "Status update kept conflicting, giving up"
                        );
                        return Err(Error::RetryExhausted {
                            work: key.to_string(),
                            attempts: backoff.attempts(),
                        });
                    };

                    warn!(
                        attempt = backoff.attempts(),
                        resource_version = %candidate.resource_version,
                        delay_ms = delay.as_millis() as u64,
                        "Status update conflicted, retrying"
                    );

                    until_cancelled(cancel, async {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    })
                    .await?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Race `fut` against the cancellation token, preferring cancellation.
async fn until_cancelled<T, Fut>(cancel: &CancellationToken, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Canceled),
        result = fut => result,
    }
}
