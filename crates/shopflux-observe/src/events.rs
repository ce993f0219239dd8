#![forbid(unsafe_code)]

//! Typed change-event registry.
//!
//! UI widgets subscribe to named events; the observer engine emits into the
//! registry when a subtree changes. Keys are `(EventKind, optional entry
//! id)` pairs rather than concatenated strings, so subscribing to one entry
//! of a normalized collection never receives updates for its siblings.
//!
//! # Architecture
//!
//! The bus is a single-threaded `Rc<RefCell<..>>` handle; cloning it clones
//! the handle, not the registry. Subscribing returns an RAII
//! [`Subscription`] guard that unsubscribes on drop.
//!
//! # Invariants
//!
//! 1. Handlers for one key are delivered in registration order.
//! 2. An entry-scoped emit reaches the entry's subscribers first, then the
//!    collection-wide (`entry = None`) subscribers for the same kind.
//! 3. Dropping a [`Subscription`] removes the handler before the next emit.
//! 4. Emission never holds the registry borrow while a handler runs, so
//!    handlers may subscribe or unsubscribe freely.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use shopflux_core::StateValue;

/// A fixed event name; one per observer-tree leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventKind(pub &'static str);

/// Channel for operation failures that carry no state transition.
pub const ERROR_EVENT: EventKind = EventKind("error");

/// Payload delivered to subscribers. Snapshot values are Rc-backed, so the
/// clones here are cheap.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    /// Prior subtree; `None` on first observation.
    pub old: Option<StateValue>,
    /// New subtree; `None` when the subtree was removed.
    pub new: Option<StateValue>,
    /// Dotted path from the state root, empty at the root.
    pub path: String,
    /// Indexed-collection entry id, when the change is entry-scoped.
    pub entry: Option<String>,
}

pub type Handler = Rc<dyn Fn(&ChangeEvent)>;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct EventKey {
    kind: EventKind,
    entry: Option<String>,
}

#[derive(Default)]
struct BusInner {
    subs: AHashMap<EventKey, Vec<(u64, Handler)>>,
    next_token: u64,
}

/// Cloneable handle to the subscriber registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every emit of `kind`, entry-scoped or not.
    pub fn on(&self, kind: EventKind, handler: impl Fn(&ChangeEvent) + 'static) -> Subscription {
        self.subscribe(EventKey { kind, entry: None }, Rc::new(handler))
    }

    /// Subscribe to emits of `kind` scoped to one collection entry.
    pub fn on_entry(
        &self,
        kind: EventKind,
        entry: impl Into<String>,
        handler: impl Fn(&ChangeEvent) + 'static,
    ) -> Subscription {
        self.subscribe(
            EventKey {
                kind,
                entry: Some(entry.into()),
            },
            Rc::new(handler),
        )
    }

    fn subscribe(&self, key: EventKey, handler: Handler) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let token = inner.next_token;
        inner.next_token += 1;
        inner.subs.entry(key.clone()).or_default().push((token, handler));
        Subscription {
            inner: Rc::downgrade(&self.inner),
            key,
            token,
            detached: false,
        }
    }

    /// Deliver `event` to subscribers of `kind`.
    ///
    /// When `event.entry` is set, entry-scoped subscribers run first and the
    /// collection-wide subscribers run after; otherwise only the
    /// collection-wide list runs.
    pub fn emit(&self, kind: EventKind, event: &ChangeEvent) {
        let handlers: Vec<Handler> = {
            let inner = self.inner.borrow();
            let mut handlers = Vec::new();
            if let Some(entry) = &event.entry {
                let key = EventKey {
                    kind,
                    entry: Some(entry.clone()),
                };
                if let Some(subs) = inner.subs.get(&key) {
                    handlers.extend(subs.iter().map(|(_, h)| Rc::clone(h)));
                }
            }
            if let Some(subs) = inner.subs.get(&EventKey { kind, entry: None }) {
                handlers.extend(subs.iter().map(|(_, h)| Rc::clone(h)));
            }
            handlers
        };
        for handler in handlers {
            handler(event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("keys", &inner.subs.len())
            .finish()
    }
}

/// RAII subscription guard; unsubscribes on drop.
pub struct Subscription {
    inner: Weak<RefCell<BusInner>>,
    key: EventKey,
    token: u64,
    detached: bool,
}

impl Subscription {
    /// Keep the handler registered for the bus lifetime.
    pub fn forget(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.borrow_mut();
            if let Some(subs) = inner.subs.get_mut(&self.key) {
                subs.retain(|(token, _)| *token != self.token);
                if subs.is_empty() {
                    inner.subs.remove(&self.key);
                }
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("token", &self.token)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    fn event(path: &str, entry: Option<&str>) -> ChangeEvent {
        ChangeEvent {
            old: None,
            new: Some(StateValue::from(1i64)),
            path: path.to_owned(),
            entry: entry.map(str::to_owned),
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Rc::new(StdRefCell::new(Vec::new()));

        let o1 = Rc::clone(&order);
        let _s1 = bus.on(EventKind("products"), move |_| o1.borrow_mut().push(1));
        let o2 = Rc::clone(&order);
        let _s2 = bus.on(EventKind("products"), move |_| o2.borrow_mut().push(2));

        bus.emit(EventKind("products"), &event("", None));
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn entry_subscribers_do_not_hear_siblings() {
        let bus = EventBus::new();
        let hits = Rc::new(StdRefCell::new(Vec::new()));

        let h = Rc::clone(&hits);
        let _a = bus.on_entry(EventKind("nav"), "A", move |e| {
            h.borrow_mut().push(format!("A:{}", e.path));
        });
        let h = Rc::clone(&hits);
        let _all = bus.on(EventKind("nav"), move |e| {
            h.borrow_mut().push(format!("all:{}", e.path));
        });

        bus.emit(EventKind("nav"), &event(".nav.B", Some("B")));
        bus.emit(EventKind("nav"), &event(".nav.A", Some("A")));

        assert_eq!(
            *hits.borrow(),
            vec!["all:.nav.B", "A:.nav.A", "all:.nav.A"]
        );
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let count = Rc::new(StdRefCell::new(0));

        let c = Rc::clone(&count);
        let sub = bus.on(EventKind("page"), move |_| *c.borrow_mut() += 1);
        bus.emit(EventKind("page"), &event("", None));
        drop(sub);
        bus.emit(EventKind("page"), &event("", None));

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn forgotten_subscription_outlives_guard() {
        let bus = EventBus::new();
        let count = Rc::new(StdRefCell::new(0));

        let c = Rc::clone(&count);
        bus.on(EventKind("page"), move |_| *c.borrow_mut() += 1).forget();
        bus.emit(EventKind("page"), &event("", None));

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn handlers_may_unsubscribe_during_emit() {
        let bus = EventBus::new();
        let count = Rc::new(StdRefCell::new(0));
        let slot: Rc<StdRefCell<Option<Subscription>>> = Rc::new(StdRefCell::new(None));

        let c = Rc::clone(&count);
        let s = Rc::clone(&slot);
        let sub = bus.on(EventKind("once"), move |_| {
            *c.borrow_mut() += 1;
            s.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        bus.emit(EventKind("once"), &event("", None));
        bus.emit(EventKind("once"), &event("", None));
        assert_eq!(*count.borrow(), 1);
    }
}
