#![forbid(unsafe_code)]

//! Actions and the dispatchable union.
//!
//! An [`Action`] is an intent: a kind string, an optional payload slice of
//! state, pipeline metadata (validators, correlation ids), and an error flag
//! marking the payload as a caught failure rather than success data. Actions
//! are immutable from the pipeline's point of view: correlation stamping
//! happens before an action is forwarded, and nothing downstream mutates one.
//!
//! [`Dispatchable`] is what callers hand to the store: a single action, an
//! ordered batch, or a thunk — a producer that needs the current snapshot to
//! decide what the concrete action(s) should be.

use std::fmt;

use crate::state::StateValue;
use crate::validate::ValidatorSpec;

/// Built-in action kinds consumed by the pipeline itself.
pub mod kinds {
    /// Checkpoint marker appended by the batch analyzer; requests that the
    /// just-produced snapshot be persisted.
    pub const SAVE_STATE: &str = "SAVE_STATE";
    /// Compensating action emitted for rollback-eligible failures; restores
    /// the previous snapshot instead of applying the error payload.
    pub const UNDO_TRANSITION: &str = "UNDO_TRANSITION";
}

/// Pipeline metadata carried alongside the payload.
#[derive(Clone, Debug, Default)]
pub struct ActionMeta {
    /// Slot-keyed validators evaluated by the gate; absent means pass.
    pub validator: Option<ValidatorSpec>,
    /// Correlation id for the recall family (new logical query).
    pub recall_id: Option<String>,
    /// Correlation id for the search family (one network round trip).
    pub search_id: Option<String>,
}

/// A dispatched intent.
#[derive(Clone, Debug)]
pub struct Action {
    /// Kind string; compared against the pipeline's static trigger sets.
    pub kind: &'static str,
    /// Payload slice; [`StateValue::Null`] when the action carries none.
    pub payload: StateValue,
    pub meta: ActionMeta,
    /// When set, `payload` is a caught failure value, not success data.
    pub error: bool,
}

impl Action {
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            payload: StateValue::Null,
            meta: ActionMeta::default(),
            error: false,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<StateValue>) -> Self {
        self.payload = payload.into();
        self
    }

    #[must_use]
    pub fn with_validator(mut self, spec: ValidatorSpec) -> Self {
        self.meta.validator = Some(spec);
        self
    }

    /// Mark the payload as a caught failure.
    #[must_use]
    pub fn as_error(mut self) -> Self {
        self.error = true;
        self
    }
}

/// State-dependent action producer, resolved by the thunk trampoline.
pub type Thunk = Box<dyn FnOnce(&StateValue) -> Dispatchable>;

/// What callers hand to `dispatch`: one action, an ordered batch, or a
/// thunk that resolves against the current snapshot.
pub enum Dispatchable {
    One(Action),
    Many(Vec<Action>),
    Thunk(Thunk),
}

impl Dispatchable {
    /// Wrap a state-dependent producer. The producer may itself return
    /// another thunk; the trampoline resolves the chain with a depth cap.
    pub fn thunk(f: impl FnOnce(&StateValue) -> Dispatchable + 'static) -> Self {
        Self::Thunk(Box::new(f))
    }
}

impl fmt::Debug for Dispatchable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(action) => f.debug_tuple("One").field(action).finish(),
            Self::Many(actions) => f.debug_tuple("Many").field(actions).finish(),
            Self::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

impl From<Action> for Dispatchable {
    fn from(action: Action) -> Self {
        Self::One(action)
    }
}

impl From<Vec<Action>> for Dispatchable {
    fn from(actions: Vec<Action>) -> Self {
        Self::Many(actions)
    }
}
