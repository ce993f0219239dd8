//! Property-based invariant tests for the selective snapshot diff.
//!
//! These verify structural invariants that must hold for **any** snapshot
//! pair:
//!
//! 1. Diffing a snapshot against itself (or a clone) fires nothing.
//! 2. Changing exactly one observed field fires exactly the callbacks on the
//!    path from the root to that field, and no sibling's.
//! 3. Diffing is deterministic (same inputs → same firing sequence).
//! 4. First observation (`old = None`) fires every observed terminal that
//!    has a defined new value, with no prior value.
//! 5. For an indexed collection with unchanged membership, the number of
//!    entry visits equals the number of entries whose slice changed.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use shopflux_core::{IndexedState, StateValue};
use shopflux_observe::{ObserverNode, diff_snapshots};

type Log = Rc<RefCell<Vec<String>>>;

fn recording_leaf(log: &Log) -> ObserverNode {
    let log = Rc::clone(log);
    ObserverNode::leaf(move |ctx| log.borrow_mut().push(ctx.path.to_owned()))
}

/// Observer tree over the fixed storefront shape used by these tests.
fn storefront_tree(log: &Log) -> ObserverNode {
    ObserverNode::branch([
        ("query", recording_leaf(log)),
        ("page", recording_leaf(log)),
        (
            "nav",
            ObserverNode::indexed(ObserverNode::branch([("selected", recording_leaf(log))])),
        ),
    ])
}

fn scalar() -> impl Strategy<Value = StateValue> {
    prop_oneof![
        Just(StateValue::Null),
        any::<bool>().prop_map(StateValue::from),
        any::<i64>().prop_map(StateValue::from),
        "[a-z]{0,8}".prop_map(|s| StateValue::from(s.as_str())),
    ]
}

/// A storefront-shaped snapshot: query, page, and a nav collection of
/// 1..=6 entries each holding a `selected` list.
fn snapshot() -> impl Strategy<Value = StateValue> {
    (
        scalar(),
        any::<i64>(),
        proptest::collection::vec(proptest::collection::vec(0i64..50, 0..4), 1..=6),
    )
        .prop_map(|(query, page, selections)| {
            let nav = IndexedState::from_entries(selections.into_iter().enumerate().map(
                |(i, selected)| {
                    (
                        format!("n{i}"),
                        StateValue::map([(
                            "selected",
                            StateValue::list(selected.into_iter().map(StateValue::from)),
                        )]),
                    )
                },
            ));
            StateValue::map([
                ("query", query),
                ("page", StateValue::from(page)),
                ("nav", StateValue::Indexed(Rc::new(nav))),
            ])
        })
}

proptest! {
    #[test]
    fn identical_snapshots_fire_nothing(state in snapshot()) {
        let log = Log::default();
        let tree = storefront_tree(&log);
        diff_snapshots(Some(&state), Some(&state.clone()), &tree);
        prop_assert!(log.borrow().is_empty(),
            "diff of a snapshot against its clone fired {:?}", log.borrow());
    }

    #[test]
    fn single_field_change_fires_only_that_path(state in snapshot(), page in any::<i64>()) {
        let new = state.with_field("page", StateValue::from(page));
        let changed = !state.get("page").unwrap().same(new.get("page").unwrap());

        let log = Log::default();
        let tree = storefront_tree(&log);
        diff_snapshots(Some(&state), Some(&new), &tree);

        if changed {
            prop_assert_eq!(log.borrow().clone(), vec![".page".to_owned()]);
        } else {
            // Same page value: scalar equality means no change anywhere.
            prop_assert!(log.borrow().is_empty());
        }
    }

    #[test]
    fn diff_is_deterministic(old in snapshot(), new in snapshot()) {
        let log_a = Log::default();
        let tree_a = storefront_tree(&log_a);
        diff_snapshots(Some(&old), Some(&new), &tree_a);

        let log_b = Log::default();
        let tree_b = storefront_tree(&log_b);
        diff_snapshots(Some(&old), Some(&new), &tree_b);

        prop_assert_eq!(log_a.borrow().clone(), log_b.borrow().clone());
    }

    #[test]
    fn first_observation_fires_all_observed_terminals(state in snapshot()) {
        let log = Log::default();
        let tree = storefront_tree(&log);
        diff_snapshots(None, Some(&state), &tree);

        let fired = log.borrow().clone();
        prop_assert!(fired.contains(&".query".to_owned()));
        prop_assert!(fired.contains(&".page".to_owned()));
        let nav = state.get("nav").unwrap().as_indexed().unwrap();
        for id in nav.ids() {
            let expected = format!(".nav.{}.selected", id);
            prop_assert!(fired.contains(&expected));
        }
    }

    #[test]
    fn unchanged_membership_visits_only_changed_entries(
        state in snapshot(),
        entry_index in 0usize..6,
        selected in proptest::collection::vec(0i64..50, 0..4),
    ) {
        let nav = state.get("nav").unwrap().as_indexed().unwrap().clone();
        let ids = nav.ids().to_vec();
        let id = ids[entry_index % ids.len()].clone();

        // Replace one entry with a fresh reference; membership unchanged.
        let new_nav = nav.with_entry(
            id.clone(),
            StateValue::map([(
                "selected",
                StateValue::list(selected.into_iter().map(StateValue::from)),
            )]),
        );
        let new = state.with_field("nav", StateValue::Indexed(Rc::new(new_nav)));

        let visits = Rc::new(RefCell::new(Vec::new()));
        let v = Rc::clone(&visits);
        let template = ObserverNode::leaf(move |ctx| {
            v.borrow_mut().push(ctx.entry.unwrap().to_owned());
        });
        let tree = ObserverNode::branch([("nav", ObserverNode::indexed(template))]);

        diff_snapshots(Some(&state), Some(&new), &tree);

        // The rebuilt entry is a new map reference, so exactly it fires.
        prop_assert_eq!(visits.borrow().clone(), vec![id]);
    }
}
