//! Supporting types for the ManifestWork CRD status

use chrono::{DateTime, SubsecRound, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The work's manifests have been applied on the managed cluster
pub const WORK_APPLIED: &str = "Applied";
/// The applied resources exist on the managed cluster
pub const WORK_AVAILABLE: &str = "Available";
/// The work is being rolled out
pub const WORK_PROGRESSING: &str = "Progressing";
/// The work's resources are not in their expected state
pub const WORK_DEGRADED: &str = "Degraded";

/// Status of a condition
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition for status reporting
///
/// Used both for the work-level aggregate list and for each tracked
/// resource's own list.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., Applied, Available)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    #[serde(default)]
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Last time the status of the condition changed
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a new condition stamped with the current time, in whole seconds
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now().trunc_subsecs(0),
        }
    }

    /// Override the transition time and return self for chaining
    pub fn at(mut self, last_transition_time: DateTime<Utc>) -> Self {
        self.last_transition_time = last_transition_time;
        self
    }

    /// Returns true if status, reason and message all match `other`
    pub fn same_state(&self, other: &Condition) -> bool {
        self.status == other.status && self.reason == other.reason && self.message == other.message
    }
}

/// Coordinates of a resource tracked by a ManifestWork
///
/// Two entries describe the same resource iff their identities are equal.
/// The manifest ordinal is deliberately not part of it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentity {
    /// API group (empty for the core group)
    #[serde(default)]
    pub group: String,
    /// API version
    #[serde(default)]
    pub version: String,
    /// Resource kind
    #[serde(default)]
    pub kind: String,
    /// Plural resource name
    #[serde(default)]
    pub resource: String,
    /// Namespace (empty for cluster-scoped resources)
    #[serde(default)]
    pub namespace: String,
    /// Object name
    #[serde(default)]
    pub name: String,
}

impl ResourceIdentity {
    /// Identity for a namespaced object
    pub fn namespaced(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        resource: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            resource: resource.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let group = if self.group.is_empty() {
            "core"
        } else {
            self.group.as_str()
        };
        if self.namespace.is_empty() {
            write!(f, "{}/{}/{}/{}", group, self.version, self.resource, self.name)
        } else {
            write!(
                f,
                "{}/{}/{}/{}/{}",
                group, self.version, self.resource, self.namespace, self.name
            )
        }
    }
}

/// Conditions for one resource in the work's manifest list
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCondition {
    /// Position of the resource in the manifest list on the latest pass
    #[serde(default)]
    pub ordinal: i32,

    /// Which resource these conditions describe
    #[serde(rename = "resourceMeta")]
    pub identity: ResourceIdentity,

    /// Conditions observed for the resource
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ManifestCondition {
    /// Create an entry with no conditions yet
    pub fn new(ordinal: i32, identity: ResourceIdentity) -> Self {
        Self {
            ordinal,
            identity,
            conditions: Vec::new(),
        }
    }

    /// Add a condition and return self for chaining
    pub fn condition(mut self, condition: Condition) -> Self {
        // Remove existing condition of the same type
        self.conditions.retain(|c| c.type_ != condition.type_);
        self.conditions.push(condition);
        self
    }
}
