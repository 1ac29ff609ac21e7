//! [`WorkStore`] backed by the ManifestWork custom resource

use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use tracing::debug;

use super::{WorkKey, WorkRecord, WorkStore};
use crate::config::UpdaterConfig;
use crate::crd::ManifestWork;
use crate::{Error, Result};

/// Reads and writes ManifestWork status through the Kubernetes API
///
/// Status writes are merge patches against the status subresource that carry
/// `metadata.resourceVersion`. The API server rejects such a patch with 409
/// when the version is stale, which gives the same optimistic concurrency as
/// a full replace without resending the spec.
pub struct KubeWorkStore {
    client: Client,
    field_manager: String,
}

impl KubeWorkStore {
    /// Create a store using the given client and field manager name
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    /// Create a store using the field manager from loaded configuration
    pub fn from_config(client: Client, config: &UpdaterConfig) -> Self {
        Self::new(client, config.field_manager.clone())
    }

    fn api(&self, namespace: &str) -> Api<ManifestWork> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl WorkStore for KubeWorkStore {
    async fn get(&self, key: &WorkKey) -> Result<WorkRecord> {
        let work = self
            .api(&key.namespace)
            .get(&key.name)
            .await
            .map_err(|e| classify(e, key))?;
        to_record(key, work)
    }

    async fn update_status(&self, record: &WorkRecord) -> Result<WorkRecord> {
        let patch = status_patch(record);
        debug!(work = %record.key, resource_version = %record.resource_version, "Patching status");

        let work = self
            .api(&record.key.namespace)
            .patch_status(
                &record.key.name,
                &PatchParams::apply(&self.field_manager),
                &Patch::Merge(&patch),
            )
            .await
            .map_err(|e| classify(e, &record.key))?;
        to_record(&record.key, work)
    }
}

/// Map API status codes onto the store's error contract
fn classify(err: kube::Error, key: &WorkKey) -> Error {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => Error::NotFound(key.to_string()),
        kube::Error::Api(ae) if ae.code == 409 => Error::Conflict(key.to_string()),
        other => Error::Kube(other),
    }
}

/// Build the merge patch for a status write.
///
/// Both lists are always present so an emptied list clears the stored one;
/// merge patches leave omitted fields alone.
fn status_patch(record: &WorkRecord) -> serde_json::Value {
    serde_json::json!({
        "metadata": {
            "resourceVersion": record.resource_version,
        },
        "status": {
            "conditions": record.status.conditions,
            "manifestConditions": record.status.manifest_conditions,
        }
    })
}

fn to_record(key: &WorkKey, work: ManifestWork) -> Result<WorkRecord> {
    let resource_version = work.metadata.resource_version.ok_or_else(|| {
        Error::serialization(format!("ManifestWork {key} has no resourceVersion"))
    })?;
    Ok(WorkRecord {
        key: key.clone(),
        status: work.status.unwrap_or_default(),
        resource_version,
    })
}
