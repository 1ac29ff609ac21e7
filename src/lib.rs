//! Lattice work - status reconciliation for ManifestWorks
//!
//! The work agent on a managed cluster applies the manifests a hub hands it
//! and reports back, per resource and for the work as a whole, what it
//! observed. This crate is the part that turns those observations into a
//! persisted status without losing history or writing more than necessary.
//!
//! # Architecture
//!
//! - Condition lists are merged by type, resource lists by identity. Merges
//!   keep the previous transition time whenever a condition's status did not
//!   change, and drop entries the new observation no longer contains.
//! - Writes go through [`status::StatusUpdater`], which compares the mutated
//!   status with what it fetched and only writes on a difference.
//! - Concurrency is optimistic: every write carries the resource version it
//!   was based on, and a conflict means fetch, mutate and try again.
//!
//! # Modules
//!
//! - [`crd`] - ManifestWork CRD and condition types
//! - [`conditions`] - Setting and merging flat condition lists
//! - [`manifest`] - Merging per-resource condition lists
//! - [`status`] - Store abstraction and the status updater
//! - [`retry`] - Backoff policy for conflicting writes
//! - [`config`] - Environment configuration
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod conditions;
pub mod config;
pub mod crd;
pub mod error;
pub mod manifest;
pub mod retry;
pub mod status;

pub use conditions::{merge_status_conditions, set_condition};
pub use error::Error;
pub use manifest::merge_manifest_conditions;
pub use status::{StatusUpdate, StatusUpdater, WorkKey, WorkRecord, WorkStore};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
