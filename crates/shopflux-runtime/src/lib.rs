#![forbid(unsafe_code)]

//! Validated, correlated dispatch pipeline and store for ShopFlux.
//!
//! The [`Store`] owns the snapshot and runs every dispatch through the
//! middleware chain: thunk resolution, the validator gate, correlation
//! stamping, error/recovery, the effect seam, and the batch & persistence
//! analyzer — then folds the batch through the external reducer and hands
//! the old and new snapshots to the `shopflux-observe` diff engine.
//!
//! Collaborator seams: [`Reducer`] (pure transitions, structural sharing
//! mandatory), [`EffectRunner`] (async work via queued follow-ups), and
//! [`CheckpointSink`]/[`StateSource`] (persistence).

pub mod effects;
pub mod history;
pub mod persist;
pub mod pipeline;
pub mod store;

pub use effects::{EffectRunner, FollowUps};
pub use history::History;
#[cfg(feature = "state-persistence")]
pub use persist::JsonFileSink;
pub use persist::{CheckpointSink, NullSink, StateSource};
pub use pipeline::{
    CorrelationStamper, DroppedAction, MintedIds, RecoverySplit, analyze, gate, recover,
    resolve_thunks,
};
pub use store::{DispatchReport, Reducer, Store, StoreBuilder};
