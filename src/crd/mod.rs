//! Custom Resource Definitions for the Lattice work agent
//!
//! This module contains the ManifestWork CRD and the condition types carried
//! in its status.

mod types;
mod work;

pub use types::{
    Condition, ConditionStatus, ManifestCondition, ResourceIdentity, WORK_APPLIED, WORK_AVAILABLE,
    WORK_DEGRADED, WORK_PROGRESSING,
};
pub use work::{ManifestWork, ManifestWorkSpec, ManifestWorkStatus, ManifestsTemplate};
