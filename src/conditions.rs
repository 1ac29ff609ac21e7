//! Condition list maintenance
//!
//! Two operations keep condition lists honest about *when* things changed:
//!
//! - [`set_condition`] folds a single observed condition into a list the
//!   caller owns, reporting whether anything actually changed.
//! - [`merge_status_conditions`] reconciles a freshly computed list against
//!   the persisted one, carrying over transition times for conditions whose
//!   status did not move.
//!
//! In both, `last_transition_time` tracks changes of `status` only. A new
//! reason or message is a change worth writing, but not a transition.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, SubsecRound, Utc};

use crate::crd::{Condition, ConditionStatus};

/// Set `incoming` in `conditions`, using the wall clock for transitions.
///
/// Returns true if the list was modified. See [`set_condition_at`].
pub fn set_condition(conditions: &mut Vec<Condition>, incoming: Condition) -> bool {
    set_condition_at(conditions, incoming, Utc::now())
}

/// Set `incoming` in `conditions`, stamping transitions with `now`.
///
/// - Unknown type: `incoming` is appended unchanged.
/// - Same status, reason and message: nothing changes.
/// - Different status: status, reason and message are replaced and the
///   transition time becomes `now` (whole seconds). The transition time on
///   `incoming` is ignored.
/// - Same status, different reason or message: those two fields are
///   replaced, the transition time is kept.
pub fn set_condition_at(
    conditions: &mut Vec<Condition>,
    incoming: Condition,
    now: DateTime<Utc>,
) -> bool {
    let Some(existing) = conditions.iter_mut().find(|c| c.type_ == incoming.type_) else {
        conditions.push(incoming);
        return true;
    };

    if existing.same_state(&incoming) {
        return false;
    }

    if existing.status != incoming.status {
        existing.status = incoming.status;
        existing.last_transition_time = now.trunc_subsecs(0);
    }
    existing.reason = incoming.reason;
    existing.message = incoming.message;
    true
}

/// Find the condition of the given type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Remove the condition of the given type. Returns true if one was removed.
pub fn remove_condition(conditions: &mut Vec<Condition>, type_: &str) -> bool {
    let before = conditions.len();
    conditions.retain(|c| c.type_ != type_);
    conditions.len() != before
}

/// Returns true if the condition is present and its status equals `status`
pub fn is_condition_present_and_equal(
    conditions: &[Condition],
    type_: &str,
    status: ConditionStatus,
) -> bool {
    find_condition(conditions, type_).is_some_and(|c| c.status == status)
}

/// Returns true if the condition is present with status True
pub fn is_condition_true(conditions: &[Condition], type_: &str) -> bool {
    is_condition_present_and_equal(conditions, type_, ConditionStatus::True)
}

/// Returns true if the condition is present with status False
pub fn is_condition_false(conditions: &[Condition], type_: &str) -> bool {
    is_condition_present_and_equal(conditions, type_, ConditionStatus::False)
}

/// Reconcile a freshly computed condition list against the persisted one.
///
/// The result follows `new`: same order, same entries, and types missing from
/// `new` are gone. A condition keeps the transition time from `old` when `old`
/// has the same type with the same status; otherwise its own time is used.
/// If a type repeats within a list, its first occurrence wins.
pub fn merge_status_conditions(old: &[Condition], new: &[Condition]) -> Vec<Condition> {
    let mut previous: HashMap<&str, &Condition> = HashMap::with_capacity(old.len());
    for condition in old {
        previous.entry(condition.type_.as_str()).or_insert(condition);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(new.len());
    let mut merged: Vec<Condition> = Vec::with_capacity(new.len());
    for condition in new {
        if !seen.insert(condition.type_.as_str()) {
            continue;
        }

        let mut condition = condition.clone();
        if let Some(prev) = previous.get(condition.type_.as_str()) {
            if prev.status == condition.status {
                condition.last_transition_time = prev.last_transition_time;
            }
        }
        merged.push(condition);
    }
    merged
}
