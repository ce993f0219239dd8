#![forbid(unsafe_code)]

//! Persistence seams: checkpoint sink and rehydration source.
//!
//! The batch analyzer appends a checkpoint marker to history-worthy
//! batches; when the store reduces such a batch it hands the post-batch
//! snapshot to the configured [`CheckpointSink`]. Both directions are
//! fire-and-forget: a sink that fails logs and moves on, and a source that
//! cannot produce a snapshot yields `None`. Nothing here may fail the
//! dispatch that triggered it.

use shopflux_core::StateValue;

/// Accepts full-state snapshots on the checkpoint marker.
pub trait CheckpointSink {
    fn checkpoint(&mut self, state: &StateValue);
}

/// Produces a previously persisted snapshot, if one exists.
pub trait StateSource {
    fn rehydrate(&mut self) -> Option<StateValue>;
}

/// Sink/source that persists nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl CheckpointSink for NullSink {
    fn checkpoint(&mut self, _state: &StateValue) {}
}

impl StateSource for NullSink {
    fn rehydrate(&mut self) -> Option<StateValue> {
        None
    }
}

#[cfg(feature = "state-persistence")]
pub use file_sink::JsonFileSink;

#[cfg(feature = "state-persistence")]
mod file_sink {
    use std::path::PathBuf;

    use shopflux_core::StateValue;
    use tracing::warn;

    use super::{CheckpointSink, StateSource};

    /// File-backed persistence: each checkpoint overwrites `path` with the
    /// JSON-encoded snapshot; rehydration reads it back.
    #[derive(Clone, Debug)]
    pub struct JsonFileSink {
        path: PathBuf,
    }

    impl JsonFileSink {
        #[must_use]
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }
    }

    impl CheckpointSink for JsonFileSink {
        fn checkpoint(&mut self, state: &StateValue) {
            let encoded = match serde_json::to_vec(state) {
                Ok(encoded) => encoded,
                Err(err) => {
                    warn!(%err, "checkpoint encode failed");
                    return;
                }
            };
            if let Err(err) = std::fs::write(&self.path, encoded) {
                warn!(%err, path = %self.path.display(), "checkpoint write failed");
            }
        }
    }

    impl StateSource for JsonFileSink {
        fn rehydrate(&mut self) -> Option<StateValue> {
            let bytes = match std::fs::read(&self.path) {
                Ok(bytes) => bytes,
                Err(_) => return None, // no prior checkpoint
            };
            match serde_json::from_slice(&bytes) {
                Ok(state) => Some(state),
                Err(err) => {
                    warn!(%err, path = %self.path.display(), "rehydrate decode failed");
                    None
                }
            }
        }
    }
}
