//! Per-resource condition reconciliation
//!
//! Each pass of the work agent rebuilds the list of tracked resources from
//! the manifests it was asked to apply. Merging that list into the persisted
//! one prunes resources that are no longer tracked (absence is the removal
//! signal) and keeps transition times for conditions that did not flip.

use std::collections::{HashMap, HashSet};

use crate::conditions::merge_status_conditions;
use crate::crd::{ManifestCondition, ResourceIdentity};

/// Reconcile freshly observed resource conditions against the persisted list.
///
/// The result has one entry per identity in `new`, in `new`'s order, carrying
/// `new`'s ordinal and conditions. Conditions of a resource that also appears
/// in `old` (matched by identity, ordinal ignored) go through
/// [`merge_status_conditions`], so unchanged statuses keep their transition
/// time. Resources only in `old` are dropped. If an identity repeats within a
/// list, its first occurrence wins.
pub fn merge_manifest_conditions(
    old: &[ManifestCondition],
    new: &[ManifestCondition],
) -> Vec<ManifestCondition> {
    let mut previous: HashMap<&ResourceIdentity, &ManifestCondition> =
        HashMap::with_capacity(old.len());
    for entry in old {
        previous.entry(&entry.identity).or_insert(entry);
    }

    let mut seen: HashSet<&ResourceIdentity> = HashSet::with_capacity(new.len());
    let mut merged: Vec<ManifestCondition> = Vec::with_capacity(new.len());
    for entry in new {
        if !seen.insert(&entry.identity) {
            continue;
        }

        let conditions = match previous.get(&entry.identity) {
            Some(prev) => merge_status_conditions(&prev.conditions, &entry.conditions),
            None => merge_status_conditions(&[], &entry.conditions),
        };
        merged.push(ManifestCondition {
            ordinal: entry.ordinal,
            identity: entry.identity.clone(),
            conditions,
        });
    }
    merged
}

/// Find the entry for a resource by identity
pub fn find_manifest_condition<'a>(
    manifests: &'a [ManifestCondition],
    identity: &ResourceIdentity,
) -> Option<&'a ManifestCondition> {
    manifests.iter().find(|m| &m.identity == identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Condition, ConditionStatus};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn resource(name: &str) -> ResourceIdentity {
        ResourceIdentity::namespaced("", "v1", "ConfigMap", "configmaps", "ns1", name)
    }

    fn cond(type_: &str, status: ConditionStatus, at: DateTime<Utc>) -> Condition {
        Condition::new(type_, status, "my-reason", "my-message").at(at)
    }

    fn manifest(ordinal: i32, name: &str, conditions: Vec<Condition>) -> ManifestCondition {
        ManifestCondition {
            ordinal,
            identity: resource(name),
            conditions,
        }
    }

    #[test]
    fn test_add_to_empty() {
        let new = vec![manifest(0, "resource1", vec![cond("one", ConditionStatus::True, t(1))])];
        assert_eq!(merge_manifest_conditions(&[], &new), new);
    }

    #[test]
    fn test_add_new_resource() {
        let old = vec![manifest(0, "resource1", vec![cond("one", ConditionStatus::True, t(0))])];
        let new = vec![
            manifest(0, "resource1", vec![cond("one", ConditionStatus::True, t(9))]),
            manifest(1, "resource2", vec![cond("two", ConditionStatus::True, t(9))]),
        ];

        let merged = merge_manifest_conditions(&old, &new);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].conditions[0].last_transition_time, t(0));
        assert_eq!(merged[1], new[1]);
    }

    #[test]
    fn test_update_existing_replaces_condition_types() {
        let old = vec![manifest(0, "resource1", vec![cond("one", ConditionStatus::True, t(0))])];
        let new = vec![manifest(0, "resource1", vec![cond("two", ConditionStatus::True, t(9))])];

        let merged = merge_manifest_conditions(&old, &new);
        assert_eq!(merged, new);
    }

    #[test]
    fn test_remove_untracked_and_keep_time_across_ordinal_change() {
        let transition = t(-300);
        let old = vec![
            manifest(0, "resource1", vec![cond("one", ConditionStatus::True, t(0))]),
            manifest(1, "resource2", vec![cond("two", ConditionStatus::True, transition)]),
        ];
        let new = vec![manifest(0, "resource2", vec![cond("two", ConditionStatus::True, t(9))])];

        let merged = merge_manifest_conditions(&old, &new);
        assert_eq!(
            merged,
            vec![manifest(0, "resource2", vec![cond("two", ConditionStatus::True, transition)])]
        );
    }

    #[test]
    fn test_status_flip_takes_new_time() {
        let old = vec![manifest(0, "resource1", vec![cond("one", ConditionStatus::True, t(0))])];
        let new = vec![manifest(0, "resource1", vec![cond("one", ConditionStatus::False, t(9))])];

        let merged = merge_manifest_conditions(&old, &new);
        assert_eq!(merged[0].conditions[0].last_transition_time, t(9));
    }

    #[test]
    fn test_identity_includes_namespace() {
        let mut other_ns = resource("resource1");
        other_ns.namespace = "ns2".into();
        let old = vec![manifest(0, "resource1", vec![cond("one", ConditionStatus::True, t(0))])];
        let new = vec![ManifestCondition {
            ordinal: 0,
            identity: other_ns,
            conditions: vec![cond("one", ConditionStatus::True, t(9))],
        }];

        let merged = merge_manifest_conditions(&old, &new);
        assert_eq!(merged[0].conditions[0].last_transition_time, t(9));
    }

    #[test]
    fn test_duplicate_identities_keep_first() {
        let new = vec![
            manifest(0, "resource1", vec![cond("one", ConditionStatus::True, t(1))]),
            manifest(1, "resource2", vec![]),
            manifest(2, "resource1", vec![cond("one", ConditionStatus::False, t(2))]),
        ];

        let merged = merge_manifest_conditions(&[], &new);
        assert_eq!(merged, vec![new[0].clone(), new[1].clone()]);
    }

    #[test]
    fn test_large_list_with_repeats() {
        let new: Vec<_> = (0..2000)
            .map(|i| manifest(i, &format!("r{}", i % 1000), vec![]))
            .collect();

        let merged = merge_manifest_conditions(&[], &new);
        assert_eq!(merged.len(), 1000);
        assert!(merged.iter().enumerate().all(|(i, m)| m.ordinal == i as i32));
    }

    #[test]
    fn test_find_manifest_condition() {
        let list = vec![
            manifest(0, "a", vec![]),
            manifest(1, "b", vec![cond("one", ConditionStatus::True, t(0))]),
        ];
        assert_eq!(
            find_manifest_condition(&list, &resource("b")).map(|m| m.ordinal),
            Some(1)
        );
        assert!(find_manifest_condition(&list, &resource("c")).is_none());
    }

    fn arb_condition() -> impl Strategy<Value = Condition> {
        (
            prop::sample::select(vec!["Applied", "Available"]),
            prop_oneof![Just(ConditionStatus::True), Just(ConditionStatus::False)],
            0i64..1000,
        )
            .prop_map(|(type_, status, secs)| cond(type_, status, t(secs)))
    }

    fn arb_manifest() -> impl Strategy<Value = ManifestCondition> {
        (
            0i32..8,
            prop::sample::select(vec!["a", "b", "c", "d"]),
            prop::collection::vec(arb_condition(), 0..3),
        )
            .prop_map(|(ordinal, name, conditions)| manifest(ordinal, name, conditions))
    }

    proptest! {
        #[test]
        fn merge_is_idempotent(
            old in prop::collection::vec(arb_manifest(), 0..5),
            new in prop::collection::vec(arb_manifest(), 0..5),
        ) {
            let once = merge_manifest_conditions(&old, &new);
            let twice = merge_manifest_conditions(&once, &new);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn merge_prunes_identities_missing_from_new(
            old in prop::collection::vec(arb_manifest(), 0..5),
            new in prop::collection::vec(arb_manifest(), 0..5),
        ) {
            let merged = merge_manifest_conditions(&old, &new);
            for entry in &old {
                if !new.iter().any(|n| n.identity == entry.identity) {
                    prop_assert!(find_manifest_condition(&merged, &entry.identity).is_none());
                }
            }
        }
    }
}
