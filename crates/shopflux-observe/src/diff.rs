#![forbid(unsafe_code)]

//! Selective snapshot diffing.
//!
//! Given two consecutive snapshots and the observer tree, fire exactly the
//! callbacks whose subtree changed. The walk follows the observer tree's
//! statically known shape, never the state tree's, so termination is
//! structural and no path is visited twice.
//!
//! # Invariants
//!
//! 1. Reference-equal subtrees are skipped without descending: cost is
//!    proportional to the number of *changed* subtrees, not tree size.
//! 2. A callback on a node with children fires before descent; a child
//!    callback never suppresses its ancestor's.
//! 3. A wholly absent prior snapshot is valid ("no prior value", first
//!    observation): every terminal with a defined new value still fires,
//!    with `None` as the old side.
//! 4. Neither snapshot is ever mutated.
//! 5. An indexed node compares `all_ids` by reference first; when membership
//!    is unchanged, only entries whose slice is not reference-equal are
//!    re-diffed — O(changed entries), not O(total entries × subtree size).

use shopflux_core::StateValue;
use tracing::trace;

use crate::node::{Callback, ChangeCtx, Children, ObserverNode};

/// Diff `old` against `new` and fire the observer tree's callbacks for every
/// changed subtree. `None` stands for an absent snapshot side.
pub fn diff_snapshots(old: Option<&StateValue>, new: Option<&StateValue>, tree: &ObserverNode) {
    let mut path = String::new();
    walk(old, new, tree, &mut path, None);
}

fn walk(
    old: Option<&StateValue>,
    new: Option<&StateValue>,
    node: &ObserverNode,
    path: &mut String,
    entry: Option<&str>,
) {
    // The primary performance invariant: an unchanged subtree is skipped
    // whole, by the reducer layer's structural-sharing contract.
    if StateValue::same_opt(old, new) {
        return;
    }
    match node {
        ObserverNode::Leaf(callback) => fire(callback, old, new, path, entry),
        ObserverNode::Branch(children) => descend(old, new, children, path, entry),
        ObserverNode::Both(callback, children) => {
            fire(callback, old, new, path, entry);
            descend(old, new, children, path, entry);
        }
        ObserverNode::Indexed(callback, template) => {
            if let Some(callback) = callback {
                fire(callback, old, new, path, entry);
            }
            diff_indexed(old, new, template, path);
        }
    }
}

fn fire(
    callback: &Callback,
    old: Option<&StateValue>,
    new: Option<&StateValue>,
    path: &str,
    entry: Option<&str>,
) {
    trace!(path, "observer fired");
    callback(&ChangeCtx {
        old,
        new,
        path,
        entry,
    });
}

fn descend(
    old: Option<&StateValue>,
    new: Option<&StateValue>,
    children: &Children,
    path: &mut String,
    entry: Option<&str>,
) {
    for (key, child) in children {
        let parent_len = path.len();
        path.push('.');
        path.push_str(key);
        walk(
            old.and_then(|v| v.get(key)),
            new.and_then(|v| v.get(key)),
            child,
            path,
            entry,
        );
        path.truncate(parent_len);
    }
}

/// Entry-wise diff of a normalized collection.
///
/// Membership is read from `new.all_ids`; an id added since `old` diffs
/// against `None`. When the `all_ids` reference is unchanged this loop is
/// the optimized path: every untouched entry short-circuits on reference
/// equality and only the changed entries reach the template.
fn diff_indexed(
    old: Option<&StateValue>,
    new: Option<&StateValue>,
    template: &ObserverNode,
    path: &mut String,
) {
    let old_ix = old.and_then(StateValue::as_indexed);
    let Some(new_ix) = new.and_then(StateValue::as_indexed) else {
        return;
    };

    if let Some(old_ix) = old_ix {
        if std::rc::Rc::ptr_eq(&old_ix.all_ids, &new_ix.all_ids) {
            trace!(path = path.as_str(), "membership unchanged");
        }
    }

    for id in new_ix.ids() {
        let old_entry = old_ix.and_then(|ix| ix.entry(id));
        let new_entry = new_ix.entry(id);
        if StateValue::same_opt(old_entry, new_entry) {
            continue;
        }
        let parent_len = path.len();
        path.push('.');
        path.push_str(id);
        walk(old_entry, new_entry, template, path, Some(id));
        path.truncate(parent_len);
    }
}
