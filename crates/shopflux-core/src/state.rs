#![forbid(unsafe_code)]

//! Immutable, structurally shared state snapshots.
//!
//! A [`StateValue`] is one node of the normalized state tree that reducers
//! transition and the observer engine diffs. Interior collections are behind
//! [`Rc`], so cloning a snapshot is O(1) and two consecutive snapshots share
//! every subtree the reducer did not touch.
//!
//! # Invariants
//!
//! 1. A snapshot is never mutated after construction; reducers build a new
//!    value and re-link unchanged subtrees by reference.
//! 2. [`StateValue::same`] is the change-detection primitive: pointer
//!    equality for reference variants, value equality for scalars. Reducers
//!    MUST return the same reference for unchanged subtrees and a new
//!    reference for changed ones, or diffing degrades to false positives.
//! 3. [`IndexedState::all_ids`] is reference-counted independently of the
//!    entry map so collection membership changes are detectable separately
//!    from entry changes.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// One node of an immutable state snapshot.
///
/// Scalars are stored inline; strings, lists, maps, and indexed collections
/// are behind [`Rc`] so snapshots share structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// Absent/empty value (`null` on the wire).
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// Normalized `{ byId, allIds }` collection.
    Indexed(Rc<IndexedState>),
    List(Rc<Vec<StateValue>>),
    Map(Rc<BTreeMap<String, StateValue>>),
}

/// A normalized collection: an ordered id list plus an id-keyed entry map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexedState {
    #[serde(rename = "byId")]
    pub by_id: BTreeMap<String, StateValue>,
    #[serde(rename = "allIds")]
    pub all_ids: Rc<Vec<String>>,
}

impl IndexedState {
    /// Build a collection from `(id, entry)` pairs, preserving order in
    /// `all_ids`.
    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, StateValue)>) -> Self {
        let mut by_id = BTreeMap::new();
        let mut all_ids = Vec::new();
        for (id, entry) in entries {
            let id = id.into();
            if by_id.insert(id.clone(), entry).is_none() {
                all_ids.push(id);
            }
        }
        Self {
            by_id,
            all_ids: Rc::new(all_ids),
        }
    }

    /// Entry for `id`, if present.
    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&StateValue> {
        self.by_id.get(id)
    }

    /// Ordered ids of the collection.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.all_ids
    }

    /// New collection with `id` replaced by `entry`.
    ///
    /// Membership is unchanged, so `all_ids` keeps its reference and every
    /// untouched entry keeps its subtree reference.
    #[must_use]
    pub fn with_entry(&self, id: impl Into<String>, entry: StateValue) -> Self {
        let mut by_id = self.by_id.clone();
        by_id.insert(id.into(), entry);
        Self {
            by_id,
            all_ids: Rc::clone(&self.all_ids),
        }
    }
}

impl StateValue {
    /// Build a map node from `(key, value)` pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, StateValue)>) -> Self {
        Self::Map(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build a list node.
    pub fn list(items: impl IntoIterator<Item = StateValue>) -> Self {
        Self::List(Rc::new(items.into_iter().collect()))
    }

    /// Build an indexed collection node from `(id, entry)` pairs.
    pub fn indexed<K: Into<String>>(entries: impl IntoIterator<Item = (K, StateValue)>) -> Self {
        Self::Indexed(Rc::new(IndexedState::from_entries(entries)))
    }

    /// Change detection: pointer equality for reference variants, value
    /// equality for scalars.
    ///
    /// Two deep-equal maps built separately are NOT `same`; that is the
    /// contract reducers rely on to signal "this subtree changed".
    #[must_use]
    pub fn same(&self, other: &StateValue) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => Rc::ptr_eq(a, b) || a == b,
            (Self::Indexed(a), Self::Indexed(b)) => Rc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// [`same`](Self::same) lifted over optional values. Two absent values
    /// are unchanged; present-vs-absent is a change.
    #[must_use]
    pub fn same_opt(a: Option<&StateValue>, b: Option<&StateValue>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same(b),
            _ => false,
        }
    }

    /// Field lookup: map key or indexed-collection entry id.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        match self {
            Self::Map(map) => map.get(key),
            Self::Indexed(ix) => ix.by_id.get(key),
            _ => None,
        }
    }

    /// View as an indexed collection.
    #[must_use]
    pub fn as_indexed(&self) -> Option<&IndexedState> {
        match self {
            Self::Indexed(ix) => Some(ix),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// New map with `key` replaced by `value`; untouched fields keep their
    /// subtree references. Returns a one-field map when called on a non-map.
    #[must_use]
    pub fn with_field(&self, key: impl Into<String>, value: StateValue) -> StateValue {
        let mut map = match self {
            Self::Map(map) => (**map).clone(),
            _ => BTreeMap::new(),
        };
        map.insert(key.into(), value);
        Self::Map(Rc::new(map))
    }
}

impl Default for StateValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for StateValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<String> for StateValue {
    fn from(v: String) -> Self {
        Self::Str(Rc::from(v))
    }
}
