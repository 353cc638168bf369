//! Suno REST client library.
//!
//! Provides the HTTP client for job submission, status queries and audio
//! download, plus the wire types of both completion sources (the
//! record-info poll and the inbound callback) and their normalisation
//! into [`melody_core::completion::CompletionPayload`].

pub mod api;
pub mod messages;

pub use api::{SunoApi, SunoApiError, SunoConfig};
