use std::sync::Arc;

use melody_pipeline::GenerationTracker;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Owns the pending-task registry and both completion paths.
    pub tracker: GenerationTracker,
}
