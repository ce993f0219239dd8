#![forbid(unsafe_code)]

//! Shared data model for the ShopFlux state-synchronization layer.
//!
//! This crate holds the pieces both halves of the system speak:
//!
//! - [`StateValue`]: the immutable, structurally shared snapshot tree.
//! - [`Action`] / [`Dispatchable`]: intents and the thunk/batch union that
//!   callers hand to the store.
//! - [`Validator`] / [`ValidatorSpec`]: the pure predicates gating dispatch.
//! - [`IdSource`]: correlation id minting as an explicit dependency.
//! - [`PipelineConfig`]: the static trigger sets and limits.
//!
//! The dispatch pipeline lives in `shopflux-runtime`; the selective diff
//! observer and event registry live in `shopflux-observe`.

pub mod action;
pub mod config;
pub mod correlate;
pub mod error;
pub mod state;
pub mod validate;

pub use action::{Action, ActionMeta, Dispatchable, Thunk, kinds};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use correlate::{IdSource, SequentialIds, UuidSource};
pub use error::{FluxError, Result};
pub use state::{IndexedState, StateValue};
pub use validate::{PAYLOAD_SLOT, ValidationOutcome, Validator, ValidatorSpec};
