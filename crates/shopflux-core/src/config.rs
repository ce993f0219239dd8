#![forbid(unsafe_code)]

//! Pipeline configuration: static action-kind sets and limits.
//!
//! The trigger sets are fixed at store construction:
//!
//! - `recall_types` — kinds representing a new logical query (query text or
//!   refinement change). Must be a subset of `search_types`: a new recall
//!   always implies a new search, never the reverse.
//! - `search_types` — kinds belonging to one network round trip (recall
//!   triggers plus paging, sorting, collection switches).
//! - `rollback_types` — error-flagged kinds recovered by restoring the
//!   previous snapshot instead of applying the error payload.
//! - `history_types` — kinds whose resulting state is checkpointed for later
//!   restoration (navigation, product, count updates).

use ahash::AHashSet;

use crate::action::kinds;
use crate::error::{FluxError, Result};

/// Validated, immutable pipeline configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    recall_types: AHashSet<&'static str>,
    search_types: AHashSet<&'static str>,
    rollback_types: AHashSet<&'static str>,
    history_types: AHashSet<&'static str>,
    checkpoint_kind: &'static str,
    undo_kind: &'static str,
    thunk_depth_limit: usize,
    history_limit: usize,
}

impl PipelineConfig {
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    #[must_use]
    pub fn is_recall(&self, kind: &str) -> bool {
        self.recall_types.contains(kind)
    }

    #[must_use]
    pub fn is_search(&self, kind: &str) -> bool {
        self.search_types.contains(kind)
    }

    #[must_use]
    pub fn is_rollback_eligible(&self, kind: &str) -> bool {
        self.rollback_types.contains(kind)
    }

    #[must_use]
    pub fn is_history_worthy(&self, kind: &str) -> bool {
        self.history_types.contains(kind)
    }

    #[must_use]
    pub fn checkpoint_kind(&self) -> &'static str {
        self.checkpoint_kind
    }

    #[must_use]
    pub fn undo_kind(&self) -> &'static str {
        self.undo_kind
    }

    #[must_use]
    pub fn thunk_depth_limit(&self) -> usize {
        self.thunk_depth_limit
    }

    #[must_use]
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}

impl Default for PipelineConfig {
    /// Empty trigger sets with the built-in marker kinds and default limits.
    fn default() -> Self {
        PipelineConfigBuilder::default()
            .build()
            .expect("empty config is always valid")
    }
}

/// Builder for [`PipelineConfig`]. `build` rejects a recall set that is not
/// contained in the search set.
#[derive(Clone, Debug)]
pub struct PipelineConfigBuilder {
    recall_types: AHashSet<&'static str>,
    search_types: AHashSet<&'static str>,
    rollback_types: AHashSet<&'static str>,
    history_types: AHashSet<&'static str>,
    checkpoint_kind: &'static str,
    undo_kind: &'static str,
    thunk_depth_limit: usize,
    history_limit: usize,
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self {
            recall_types: AHashSet::new(),
            search_types: AHashSet::new(),
            rollback_types: AHashSet::new(),
            history_types: AHashSet::new(),
            checkpoint_kind: kinds::SAVE_STATE,
            undo_kind: kinds::UNDO_TRANSITION,
            thunk_depth_limit: 10,
            history_limit: 50,
        }
    }
}

impl PipelineConfigBuilder {
    #[must_use]
    pub fn recall_types(mut self, types: impl IntoIterator<Item = &'static str>) -> Self {
        self.recall_types.extend(types);
        self
    }

    #[must_use]
    pub fn search_types(mut self, types: impl IntoIterator<Item = &'static str>) -> Self {
        self.search_types.extend(types);
        self
    }

    #[must_use]
    pub fn rollback_types(mut self, types: impl IntoIterator<Item = &'static str>) -> Self {
        self.rollback_types.extend(types);
        self
    }

    #[must_use]
    pub fn history_types(mut self, types: impl IntoIterator<Item = &'static str>) -> Self {
        self.history_types.extend(types);
        self
    }

    #[must_use]
    pub fn checkpoint_kind(mut self, kind: &'static str) -> Self {
        self.checkpoint_kind = kind;
        self
    }

    #[must_use]
    pub fn undo_kind(mut self, kind: &'static str) -> Self {
        self.undo_kind = kind;
        self
    }

    /// Cap on thunk trampoline steps before the dispatch aborts.
    #[must_use]
    pub fn thunk_depth_limit(mut self, limit: usize) -> Self {
        self.thunk_depth_limit = limit;
        self
    }

    /// Bound on retained rollback snapshots.
    #[must_use]
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        if let Some(kind) = self
            .recall_types
            .iter()
            .copied()
            .find(|kind| !self.search_types.contains(kind))
        {
            return Err(FluxError::RecallNotSubsetOfSearch { kind });
        }
        Ok(PipelineConfig {
            recall_types: self.recall_types,
            search_types: self.search_types,
            rollback_types: self.rollback_types,
            history_types: self.history_types,
            checkpoint_kind: self.checkpoint_kind,
            undo_kind: self.undo_kind,
            thunk_depth_limit: self.thunk_depth_limit,
            history_limit: self.history_limit,
        })
    }
}
