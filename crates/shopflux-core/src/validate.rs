#![forbid(unsafe_code)]

//! Predicate validators attached to actions.
//!
//! A [`Validator`] is a pure predicate over `(slot value, state snapshot)`
//! plus a diagnostic message. A [`ValidatorSpec`] maps named slots to one or
//! more validators; the gate forwards an action only if every validator
//! across every slot passes.
//!
//! Validators are the single source of truth for "does this action have any
//! effect" — idempotence rules like "don't select a refinement that is
//! already selected" live here, not in reducers.
//!
//! # Invariants
//!
//! 1. Evaluation never mutates the payload or the snapshot and never panics
//!    on missing slots (an absent slot evaluates as [`StateValue::Null`]).
//! 2. All validators run even after the first failure, so diagnostics carry
//!    the complete list of failing messages.

use std::fmt;
use std::rc::Rc;

use crate::state::StateValue;

/// Slot name resolving to the whole payload rather than a named field.
pub const PAYLOAD_SLOT: &str = "payload";

/// A pure predicate with a diagnostic message.
#[derive(Clone)]
pub struct Validator {
    func: Rc<dyn Fn(&StateValue, &StateValue) -> bool>,
    msg: String,
}

impl Validator {
    pub fn new(
        msg: impl Into<String>,
        func: impl Fn(&StateValue, &StateValue) -> bool + 'static,
    ) -> Self {
        Self {
            func: Rc::new(func),
            msg: msg.into(),
        }
    }

    /// Evaluate against the slot value and the full snapshot.
    #[must_use]
    pub fn check(&self, value: &StateValue, state: &StateValue) -> bool {
        (self.func)(value, state)
    }

    #[must_use]
    pub fn msg(&self) -> &str {
        &self.msg
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("msg", &self.msg).finish()
    }
}

/// Ordered slot-to-validators mapping. Empty specs pass unconditionally.
#[derive(Clone, Debug, Default)]
pub struct ValidatorSpec {
    slots: Vec<(String, Vec<Validator>)>,
}

impl ValidatorSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator for `slot`, appending if the slot already has one.
    #[must_use]
    pub fn slot(mut self, slot: impl Into<String>, validator: Validator) -> Self {
        let slot = slot.into();
        if let Some((_, validators)) = self.slots.iter_mut().find(|(name, _)| *name == slot) {
            validators.push(validator);
        } else {
            self.slots.push((slot, vec![validator]));
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run every validator. The `"payload"` slot resolves to the whole
    /// payload; any other slot to the named field alongside it.
    #[must_use]
    pub fn evaluate(&self, payload: &StateValue, state: &StateValue) -> ValidationOutcome {
        let null = StateValue::Null;
        let mut failures = Vec::new();
        for (slot, validators) in &self.slots {
            let value = if slot == PAYLOAD_SLOT {
                payload
            } else {
                payload.get(slot).unwrap_or(&null)
            };
            for validator in validators {
                if !validator.check(value, state) {
                    failures.push(validator.msg().to_owned());
                }
            }
        }
        ValidationOutcome { failures }
    }
}

/// Result of evaluating a [`ValidatorSpec`]: pass, or the failing messages.
#[derive(Clone, Debug, Default)]
pub struct ValidationOutcome {
    failures: Vec<String>,
}

impl ValidationOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Messages of every failing validator, in slot order.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    #[must_use]
    pub fn into_failures(self) -> Vec<String> {
        self.failures
    }
}
