#![forbid(unsafe_code)]

//! Effect runner seam and the cooperative follow-up queue.
//!
//! The effect runner is external: given specific action kinds it performs
//! asynchronous work (network calls) and yields further actions. It never
//! dispatches reentrantly — follow-ups go onto a [`FollowUps`] queue that
//! the store drains after the current pass completes, so each dispatch runs
//! to completion before the next begins.
//!
//! Latest-request semantics (discarding follow-ups of superseded in-flight
//! fetches) are the runner's responsibility, not the store's.

use std::collections::VecDeque;

use shopflux_core::{Action, Dispatchable};

/// Dispatchables queued for after the current pass.
#[derive(Debug, Default)]
pub struct FollowUps {
    queue: VecDeque<Dispatchable>,
}

impl FollowUps {
    /// Queue a dispatchable for the next pass.
    pub fn push(&mut self, dispatchable: impl Into<Dispatchable>) {
        self.queue.push_back(dispatchable.into());
    }

    pub(crate) fn pop(&mut self) -> Option<Dispatchable> {
        self.queue.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// External interface performing asynchronous work for specific action
/// kinds and yielding follow-up actions, including error-flagged ones on
/// failure.
pub trait EffectRunner {
    /// Offered every forwarded action; queue any follow-ups on `follow_ups`.
    fn run(&mut self, action: &Action, follow_ups: &mut FollowUps);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let mut follow_ups = FollowUps::default();
        follow_ups.push(Action::new("FIRST"));
        follow_ups.push(Action::new("SECOND"));

        assert_eq!(follow_ups.len(), 2);
        assert!(matches!(
            follow_ups.pop(),
            Some(Dispatchable::One(a)) if a.kind == "FIRST"
        ));
        assert!(matches!(
            follow_ups.pop(),
            Some(Dispatchable::One(a)) if a.kind == "SECOND"
        ));
        assert!(follow_ups.pop().is_none());
    }
}
