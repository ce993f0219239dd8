#![forbid(unsafe_code)]

//! Pipeline error types.
//!
//! Validation failures and recoverable operation failures are values flowing
//! through the pipeline, not errors; [`FluxError`] covers pipeline misuse —
//! conditions that abort the current dispatch loudly with nothing
//! half-applied.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FluxError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FluxError {
    /// A thunk chain failed to produce a concrete action within the cap.
    #[error("thunk evaluation exceeded {limit} steps without producing a concrete action")]
    ThunkDepthExceeded { limit: usize },

    /// A recall trigger kind is missing from the search trigger set; a new
    /// recall always implies a new search.
    #[error("recall trigger kind `{kind}` is not in the search trigger set")]
    RecallNotSubsetOfSearch { kind: &'static str },
}
