#![forbid(unsafe_code)]

//! Correlation id sources.
//!
//! Correlation ids are opaque unique strings stamped on causally related
//! actions so downstream consumers (analytics, effect cancellation) can
//! group them. The generator is an explicit dependency rather than module
//! state, so tests swap in a deterministic source.
//!
//! Uniqueness contract: ids must not collide across the process lifetime at
//! any practically observable rate. Dispatch is single-threaded, so no
//! cross-thread coordination is needed.

/// Source of opaque unique id strings.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Default source: random v4 UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic source for tests: `id-0`, `id-1`, ...
#[derive(Clone, Debug, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("id-{}", self.next);
        self.next += 1;
        id
    }
}
