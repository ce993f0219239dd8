#![forbid(unsafe_code)]

//! Observer tree nodes.
//!
//! The observer tree mirrors the shape of the state tree and declares which
//! subtrees anyone cares about. It is built once at startup and never
//! mutated during a diff pass. Each node is one of four explicit variants —
//! the tagged resolution of "callback, mapping, callback-with-children, or
//! indexed collection":
//!
//! - [`ObserverNode::Leaf`] — a callback fired when the subtree changed.
//! - [`ObserverNode::Branch`] — children to recurse into by key.
//! - [`ObserverNode::Both`] — a callback fired before descending into
//!   children; neither shadows the other.
//! - [`ObserverNode::Indexed`] — a normalized `{ byId, allIds }` diff point
//!   with a per-entry template and an optional collection-level callback.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use shopflux_core::StateValue;

use crate::events::{ChangeEvent, EventBus, EventKind};

/// Context handed to an observer callback for one changed subtree.
#[derive(Clone, Copy, Debug)]
pub struct ChangeCtx<'a> {
    /// Prior subtree; `None` on first observation.
    pub old: Option<&'a StateValue>,
    /// New subtree; `None` when the subtree was removed.
    pub new: Option<&'a StateValue>,
    /// Dotted path from the state root (`""` at the root, `".nav.A"` for
    /// entry `A` of collection `nav`).
    pub path: &'a str,
    /// Entry id when this callback sits under an indexed entry template.
    pub entry: Option<&'a str>,
}

pub type Callback = Rc<dyn Fn(&ChangeCtx<'_>)>;

pub type Children = BTreeMap<String, ObserverNode>;

/// One node of the observer tree. See the module docs for the variants.
pub enum ObserverNode {
    Leaf(Callback),
    Branch(Children),
    Both(Callback, Children),
    Indexed(Option<Callback>, Box<ObserverNode>),
}

impl ObserverNode {
    /// Terminal callback node.
    pub fn leaf(callback: impl Fn(&ChangeCtx<'_>) + 'static) -> Self {
        Self::Leaf(Rc::new(callback))
    }

    /// Pure mapping node: recurse into each named child.
    pub fn branch<K: Into<String>>(children: impl IntoIterator<Item = (K, ObserverNode)>) -> Self {
        Self::Branch(collect_children(children))
    }

    /// Callback plus children; the callback fires before descent.
    pub fn with_children<K: Into<String>>(
        callback: impl Fn(&ChangeCtx<'_>) + 'static,
        children: impl IntoIterator<Item = (K, ObserverNode)>,
    ) -> Self {
        Self::Both(Rc::new(callback), collect_children(children))
    }

    /// Indexed-collection diff point: `template` observes each changed entry.
    #[must_use]
    pub fn indexed(template: ObserverNode) -> Self {
        Self::Indexed(None, Box::new(template))
    }

    /// Indexed diff point with a collection-level callback, fired whenever
    /// the collection itself changed (including membership changes).
    pub fn indexed_with(
        callback: impl Fn(&ChangeCtx<'_>) + 'static,
        template: ObserverNode,
    ) -> Self {
        Self::Indexed(Some(Rc::new(callback)), Box::new(template))
    }

    /// Leaf that forwards changes to `bus` under `kind`.
    ///
    /// Under an indexed entry template the emitted event is entry-scoped, so
    /// `(kind, id)` subscribers hear only their entry while `(kind, None)`
    /// subscribers hear the whole collection.
    #[must_use]
    pub fn emit(bus: &EventBus, kind: EventKind) -> Self {
        let bus = bus.clone();
        Self::leaf(move |ctx| {
            bus.emit(
                kind,
                &ChangeEvent {
                    old: ctx.old.cloned(),
                    new: ctx.new.cloned(),
                    path: ctx.path.to_owned(),
                    entry: ctx.entry.map(str::to_owned),
                },
            );
        })
    }
}

fn collect_children<K: Into<String>>(
    children: impl IntoIterator<Item = (K, ObserverNode)>,
) -> Children {
    children.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

impl fmt::Debug for ObserverNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(_) => f.write_str("Leaf"),
            Self::Branch(children) => f
                .debug_tuple("Branch")
                .field(&children.keys().collect::<Vec<_>>())
                .finish(),
            Self::Both(_, children) => f
                .debug_tuple("Both")
                .field(&children.keys().collect::<Vec<_>>())
                .finish(),
            Self::Indexed(callback, template) => f
                .debug_struct("Indexed")
                .field("callback", &callback.is_some())
                .field("template", template)
                .finish(),
        }
    }
}
