#![forbid(unsafe_code)]

//! Bounded snapshot history for rollback.
//!
//! The store pushes the pre-dispatch snapshot whenever a dispatch changed
//! state; the compensating undo action pops and restores. Snapshots are
//! Rc-shared trees, so a retained snapshot costs one handle plus whatever
//! subtrees later transitions stopped sharing.
//!
//! # Invariants
//!
//! 1. `push` followed by `pop` returns the pushed snapshot exactly.
//! 2. The stack never holds more than `limit` snapshots; the oldest is
//!    evicted first.

use std::collections::VecDeque;

use shopflux_core::StateValue;

#[derive(Debug)]
pub struct History {
    snapshots: VecDeque<StateValue>,
    limit: usize,
}

impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            limit,
        }
    }

    /// Retain `snapshot` as the most recent restore point, evicting the
    /// oldest when over the bound.
    pub fn push(&mut self, snapshot: StateValue) {
        if self.limit == 0 {
            return;
        }
        if self.snapshots.len() == self.limit {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Most recent restore point, removing it from the stack.
    pub fn pop(&mut self) -> Option<StateValue> {
        self.snapshots.pop_back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
