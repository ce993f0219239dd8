#![forbid(unsafe_code)]

//! The store: single dispatch entry point over the middleware chain.
//!
//! Dispatch is single-threaded, cooperative, and synchronous: each call
//! runs to completion — thunk resolution, gating, stamping, recovery, the
//! reducer fold, persistence, and the observer pass — before the next
//! dispatchable (including effect follow-ups) is processed. Observer
//! callbacks must not dispatch synchronously; effects queue follow-ups
//! instead (see [`FollowUps`]).
//!
//! # Invariants
//!
//! 1. A batch is atomic: one reducer fold and exactly one observer pass per
//!    dispatch, over the pre-batch and post-batch snapshots.
//! 2. Validation failures and surfaced errors never reach the reducer;
//!    rollback-eligible failures reach it only as the undo action.
//! 3. The checkpoint sink sees the same snapshot the triggering batch
//!    produced, in the same dispatch.
//! 4. The store holds no snapshot references past the current pass beyond
//!    the bounded rollback history.

use shopflux_core::{
    Action, Dispatchable, IdSource, PipelineConfig, Result, StateValue, UuidSource,
};
use shopflux_observe::{ChangeEvent, ERROR_EVENT, EventBus, ObserverNode, diff_snapshots};
use tracing::{debug, warn};

use crate::effects::{EffectRunner, FollowUps};
use crate::history::History;
use crate::persist::{CheckpointSink, StateSource};
use crate::pipeline::{CorrelationStamper, DroppedAction, analyze, gate, recover, resolve_thunks};

/// Pure state transition: `(old state, action) -> new state`.
///
/// Reducers must honor structural sharing: a new reference for any changed
/// subtree, the same reference for unchanged ones. Change detection — and
/// with it the entire observer engine — rests on that contract.
pub trait Reducer {
    fn reduce(&self, state: &StateValue, action: &Action) -> StateValue;
}

impl<F> Reducer for F
where
    F: Fn(&StateValue, &Action) -> StateValue,
{
    fn reduce(&self, state: &StateValue, action: &Action) -> StateValue {
        self(state, action)
    }
}

/// Diagnostics for one dispatch.
#[derive(Clone, Debug, Default)]
pub struct DispatchReport {
    /// Actions that reached the reducer (checkpoint marker included).
    pub forwarded: usize,
    /// Actions dropped by the validator gate, with failing messages.
    pub dropped: Vec<DroppedAction>,
    /// Error-flagged actions surfaced on the error channel.
    pub surfaced_errors: usize,
    /// Whether the batch carried the checkpoint marker.
    pub checkpointed: bool,
    /// Whether the state reference changed.
    pub state_changed: bool,
    /// Recall id minted for this dispatch, if any.
    pub recall_id: Option<String>,
    /// Search id minted for this dispatch, if any.
    pub search_id: Option<String>,
    /// Effect follow-ups drained after the triggering pass.
    pub follow_ups: usize,
}

pub struct Store {
    state: StateValue,
    reducer: Box<dyn Reducer>,
    config: PipelineConfig,
    stamper: CorrelationStamper,
    history: History,
    observers: Option<ObserverNode>,
    bus: EventBus,
    effects: Option<Box<dyn EffectRunner>>,
    follow_ups: FollowUps,
    sink: Option<Box<dyn CheckpointSink>>,
}

impl Store {
    /// Start building a store over `initial` state and a reducer.
    #[must_use]
    pub fn builder(initial: StateValue, reducer: impl Reducer + 'static) -> StoreBuilder {
        StoreBuilder {
            initial,
            reducer: Box::new(reducer),
            config: PipelineConfig::default(),
            observers: None,
            bus: None,
            effects: None,
            sink: None,
            ids: Box::new(UuidSource),
        }
    }

    /// Dispatch an action, a batch, or a thunk, then drain any effect
    /// follow-ups. Returns diagnostics for the triggering pass.
    pub fn dispatch(&mut self, input: impl Into<Dispatchable>) -> Result<DispatchReport> {
        let mut report = self.dispatch_pass(input.into())?;
        while let Some(next) = self.follow_ups.pop() {
            let _ = self.dispatch_pass(next)?;
            report.follow_ups += 1;
        }
        Ok(report)
    }

    fn dispatch_pass(&mut self, input: Dispatchable) -> Result<DispatchReport> {
        let actions = resolve_thunks(input, &self.state, self.config.thunk_depth_limit())?;
        debug!(actions = actions.len(), "dispatch");

        let (mut actions, dropped) = gate(actions, &self.state);
        let minted = self.stamper.stamp(&mut actions, &self.config);
        let split = recover(actions, &self.config);

        for failure in &split.surfaced {
            self.bus.emit(
                ERROR_EVENT,
                &ChangeEvent {
                    old: None,
                    new: Some(failure.payload.clone()),
                    path: String::new(),
                    entry: None,
                },
            );
        }

        let mut report = DispatchReport {
            dropped,
            surfaced_errors: split.surfaced.len(),
            recall_id: minted.recall,
            search_id: minted.search,
            ..DispatchReport::default()
        };
        if split.forward.is_empty() {
            return Ok(report);
        }

        if let Some(effects) = self.effects.as_mut() {
            for action in &split.forward {
                effects.run(action, &mut self.follow_ups);
            }
        }

        let (batch, checkpoint) = analyze(split.forward, &self.config);

        let old = self.state.clone();
        let mut undid = false;
        for action in &batch {
            if action.kind == self.config.undo_kind() {
                undid = true;
                match self.history.pop() {
                    Some(previous) => self.state = previous,
                    None => warn!("undo requested with empty history; state unchanged"),
                }
            } else {
                self.state = self.reducer.reduce(&self.state, action);
            }
        }

        let changed = !old.same(&self.state);
        if changed && !undid {
            self.history.push(old.clone());
        }
        if checkpoint {
            if let Some(sink) = self.sink.as_mut() {
                sink.checkpoint(&self.state);
            }
        }
        if let Some(tree) = &self.observers {
            diff_snapshots(Some(&old), Some(&self.state), tree);
        }

        report.forwarded = batch.len();
        report.checkpointed = checkpoint;
        report.state_changed = changed;
        Ok(report)
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> &StateValue {
        &self.state
    }

    /// The event registry observer leaves and error surfacing emit into.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Retained rollback snapshots.
    #[must_use]
    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    /// Fire every observer terminal against the current snapshot with no
    /// prior value — the first-observation pass after startup.
    pub fn observe_initial(&self) {
        if let Some(tree) = &self.observers {
            diff_snapshots(None, Some(&self.state), tree);
        }
    }

    /// Replace the current snapshot with a previously persisted one, firing
    /// observers for the transition. Returns whether a snapshot was found.
    pub fn rehydrate_from(&mut self, source: &mut dyn StateSource) -> bool {
        let Some(restored) = source.rehydrate() else {
            return false;
        };
        let old = std::mem::replace(&mut self.state, restored);
        if let Some(tree) = &self.observers {
            diff_snapshots(Some(&old), Some(&self.state), tree);
        }
        true
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("history_depth", &self.history.len())
            .field("pending_follow_ups", &self.follow_ups.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Store`]; see [`Store::builder`].
pub struct StoreBuilder {
    initial: StateValue,
    reducer: Box<dyn Reducer>,
    config: PipelineConfig,
    observers: Option<ObserverNode>,
    bus: Option<EventBus>,
    effects: Option<Box<dyn EffectRunner>>,
    sink: Option<Box<dyn CheckpointSink>>,
    ids: Box<dyn IdSource>,
}

impl StoreBuilder {
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Observer tree walked after each dispatch. Built once; leaves usually
    /// forward into the bus passed via [`with_bus`](Self::with_bus).
    #[must_use]
    pub fn with_observers(mut self, tree: ObserverNode) -> Self {
        self.observers = Some(tree);
        self
    }

    /// Share an externally created bus (required when observer leaves were
    /// built with [`ObserverNode::emit`] against it).
    #[must_use]
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl EffectRunner + 'static) -> Self {
        self.effects = Some(Box::new(effects));
        self
    }

    #[must_use]
    pub fn with_checkpoint_sink(mut self, sink: impl CheckpointSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    #[must_use]
    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    #[must_use]
    pub fn build(self) -> Store {
        let history_limit = self.config.history_limit();
        Store {
            state: self.initial,
            reducer: self.reducer,
            config: self.config,
            stamper: CorrelationStamper::new(BoxedIds(self.ids)),
            history: History::new(history_limit),
            observers: self.observers,
            bus: self.bus.unwrap_or_default(),
            effects: self.effects,
            follow_ups: FollowUps::default(),
            sink: self.sink,
        }
    }
}

/// Adapter so the builder can hold a boxed source while the stamper takes
/// any `IdSource` by value.
struct BoxedIds(Box<dyn IdSource>);

impl IdSource for BoxedIds {
    fn next_id(&mut self) -> String {
        self.0.next_id()
    }
}
