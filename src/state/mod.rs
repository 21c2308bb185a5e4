//! Durable resume state.
//!
//! A single JSON checkpoint records the pagination cursor for the next page
//! and how many recordings have been processed so far. It is overwritten at
//! every page boundary and removed once a sync completes.

pub mod checkpoint;
pub mod error;

pub use checkpoint::{CheckpointState, CheckpointStore, DEFAULT_STATE_FILE};
pub use error::StateError;
