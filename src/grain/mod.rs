//! Grain workspace API surface used by the sync engine.
//!
//! The engine only sees the [`RecordingSource`] trait. [`GrainClient`] is the
//! production implementation that talks to the workspace API over HTTPS with a
//! bearer token; tests substitute scripted in-memory sources.

pub mod client;
pub mod error;
pub mod source;
pub mod types;

pub use client::{ClientConfig, GrainClient};
pub use error::SourceError;
pub use source::RecordingSource;
pub use types::{Participant, RecordingDetail, RecordingSummary};
