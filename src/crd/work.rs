//! ManifestWork Custom Resource Definition
//!
//! A ManifestWork carries a set of manifests the hub wants applied on one
//! managed cluster. The work agent on that cluster reports back what happened
//! through the status subresource: work-level conditions plus one condition
//! list per tracked resource.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{Condition, ManifestCondition};

/// Specification for a ManifestWork
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "work.lattice.dev",
    version = "v1alpha1",
    kind = "ManifestWork",
    plural = "manifestworks",
    shortname = "mw",
    status = "ManifestWorkStatus",
    namespaced,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkSpec {
    /// Manifests to apply on the managed cluster, in order
    #[serde(default)]
    pub workload: ManifestsTemplate,
}

/// Ordered list of raw manifests
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ManifestsTemplate {
    /// Raw Kubernetes objects
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifests: Vec<serde_json::Value>,
}

/// Status for a ManifestWork
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkStatus {
    /// Aggregate conditions for the whole work
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Conditions per tracked resource, in manifest order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifest_conditions: Vec<ManifestCondition>,
}

impl ManifestWorkStatus {
    /// Add a work-level condition and return self for chaining
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.retain(|c| c.type_ != condition.type_);
        self.conditions.push(condition);
        self
    }

    /// Add a resource entry and return self for chaining
    pub fn manifest(mut self, manifest: ManifestCondition) -> Self {
        self.manifest_conditions
            .retain(|m| m.identity != manifest.identity);
        self.manifest_conditions.push(manifest);
        self
    }
}
