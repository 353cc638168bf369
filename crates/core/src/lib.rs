//! Melody domain types.
//!
//! Shared by every other crate in the workspace: task and chat
//! identifiers, the parameters of a generation job, the normalised
//! completion payload produced by both notification paths, caption
//! rendering and the song-request conversation state machine.
//! Nothing in here performs I/O.

pub mod caption;
pub mod completion;
pub mod conversation;
pub mod error;
pub mod job;
pub mod types;
