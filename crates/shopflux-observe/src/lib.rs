#![forbid(unsafe_code)]

//! Selective tree-diff observer and change-event registry for ShopFlux.
//!
//! After each dispatch the store hands two consecutive snapshots to
//! [`diff_snapshots`], which walks them against a declarative
//! [`ObserverNode`] tree and fires only the callbacks whose subtree actually
//! changed. Callbacks typically forward into the typed [`EventBus`], where
//! UI widgets hold [`Subscription`]s to fixed event kinds — or to single
//! entries of normalized collections.

pub mod diff;
pub mod events;
pub mod node;

pub use diff::diff_snapshots;
pub use events::{ChangeEvent, ERROR_EVENT, EventBus, EventKind, Subscription};
pub use node::{Callback, ChangeCtx, Children, ObserverNode};
