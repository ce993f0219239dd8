#![forbid(unsafe_code)]

//! The dispatch middleware stages.
//!
//! Each stage is a plain function (or small struct) over an action batch so
//! it can be exercised in isolation; the store composes them in order:
//!
//! 1. [`resolve_thunks`] — trampoline state-dependent producers into a
//!    concrete batch, with a depth cap.
//! 2. [`gate`] — drop actions whose validators fail, collecting the failing
//!    messages as a diagnostic side channel.
//! 3. [`CorrelationStamper::stamp`] — mint at most one recall id and one
//!    search id per dispatch (recall first) and stamp every qualifying
//!    action.
//! 4. [`recover`] — split error-flagged actions into compensating undo
//!    actions (rollback-eligible kinds) or error-channel surfacing.
//! 5. [`analyze`] — append the checkpoint marker when the batch contains a
//!    history-worthy action, in the same atomic sequence.
//!
//! # Failure Modes
//!
//! - **Non-terminating thunk chain**: producers are expected to resolve in
//!   ≤2 steps; the cap (default 10) turns a cycle into a loud
//!   [`FluxError::ThunkDepthExceeded`] instead of a hang.
//! - **Stale async completion**: a late error action for a superseded
//!   request is filtered by the effect runner upstream; if one does arrive,
//!   recovery still maps it by kind only, so the outcome is a harmless
//!   undo or error event, never a half-applied batch.

use shopflux_core::{
    Action, Dispatchable, FluxError, IdSource, PipelineConfig, Result, StateValue,
};
use tracing::{debug, error};

/// Trampoline a dispatchable into a concrete action batch.
///
/// Calls any function form with the current snapshot until a plain action
/// or batch results, aborting after `limit` steps.
pub fn resolve_thunks(
    dispatchable: Dispatchable,
    state: &StateValue,
    limit: usize,
) -> Result<Vec<Action>> {
    let mut current = dispatchable;
    for _ in 0..=limit {
        match current {
            Dispatchable::One(action) => return Ok(vec![action]),
            Dispatchable::Many(actions) => return Ok(actions),
            Dispatchable::Thunk(producer) => current = producer(state),
        }
    }
    error!(limit, "thunk chain did not terminate");
    Err(FluxError::ThunkDepthExceeded { limit })
}

/// An action dropped by the gate, with every failing validator message.
#[derive(Clone, Debug)]
pub struct DroppedAction {
    pub kind: &'static str,
    pub failures: Vec<String>,
}

/// Evaluate each action's validators against the current snapshot.
///
/// Passing actions are forwarded unchanged; failing ones are dropped and
/// reported, never raised.
pub fn gate(actions: Vec<Action>, state: &StateValue) -> (Vec<Action>, Vec<DroppedAction>) {
    let mut passed = Vec::with_capacity(actions.len());
    let mut dropped = Vec::new();
    for action in actions {
        match &action.meta.validator {
            None => passed.push(action),
            Some(spec) => {
                let outcome = spec.evaluate(&action.payload, state);
                if outcome.passed() {
                    passed.push(action);
                } else {
                    debug!(kind = action.kind, failures = ?outcome.failures(), "action dropped by validator");
                    dropped.push(DroppedAction {
                        kind: action.kind,
                        failures: outcome.into_failures(),
                    });
                }
            }
        }
    }
    (passed, dropped)
}

/// Ids minted for one dispatch, if any action triggered the family.
#[derive(Clone, Debug, Default)]
pub struct MintedIds {
    pub recall: Option<String>,
    pub search: Option<String>,
}

/// Stamps correlation ids onto qualifying actions.
pub struct CorrelationStamper {
    ids: Box<dyn IdSource>,
}

impl CorrelationStamper {
    pub fn new(ids: impl IdSource + 'static) -> Self {
        Self { ids: Box::new(ids) }
    }

    /// Stamp every action whose kind is in a trigger family.
    ///
    /// At most one id per family is minted per dispatch and shared by every
    /// qualifying action in the batch; the recall id is minted before the
    /// search id (a new recall always implies a new search). Actions outside
    /// both sets are untouched.
    pub fn stamp(&mut self, actions: &mut [Action], config: &PipelineConfig) -> MintedIds {
        let mut minted = MintedIds::default();
        for action in actions.iter_mut() {
            if config.is_recall(action.kind) {
                let id = minted
                    .recall
                    .get_or_insert_with(|| self.ids.next_id())
                    .clone();
                action.meta.recall_id = Some(id);
            }
        }
        for action in actions.iter_mut() {
            if config.is_search(action.kind) {
                let id = minted
                    .search
                    .get_or_insert_with(|| self.ids.next_id())
                    .clone();
                action.meta.search_id = Some(id);
            }
        }
        minted
    }
}

impl std::fmt::Debug for CorrelationStamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CorrelationStamper")
    }
}

/// Outcome of the error/recovery split.
#[derive(Debug, Default)]
pub struct RecoverySplit {
    /// Actions the reducer will see, with rollback-eligible failures
    /// replaced by the compensating undo action.
    pub forward: Vec<Action>,
    /// Error-flagged actions diverted to the error channel; these never
    /// reach the reducer.
    pub surfaced: Vec<Action>,
}

/// Apply the two-tier failure policy.
///
/// Error-flagged actions of a rollback-eligible kind become the undo action
/// (the speculative transition is unwound atomically); any other
/// error-flagged action is surfaced and stops propagating.
pub fn recover(actions: Vec<Action>, config: &PipelineConfig) -> RecoverySplit {
    let mut split = RecoverySplit::default();
    for action in actions {
        if !action.error {
            split.forward.push(action);
        } else if config.is_rollback_eligible(action.kind) {
            debug!(kind = action.kind, "failure is rollback-eligible; forwarding undo");
            split.forward.push(Action::new(config.undo_kind()));
        } else {
            debug!(kind = action.kind, "failure surfaced on error channel");
            split.surfaced.push(action);
        }
    }
    split
}

/// Append the checkpoint marker when the batch warrants persistence.
///
/// The marker rides in the same sequence as the triggering actions so the
/// persisted state is never out of sync with them.
pub fn analyze(mut actions: Vec<Action>, config: &PipelineConfig) -> (Vec<Action>, bool) {
    let worthy = actions
        .iter()
        .any(|action| config.is_history_worthy(action.kind));
    if worthy {
        actions.push(Action::new(config.checkpoint_kind()));
    }
    (actions, worthy)
}
