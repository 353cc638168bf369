use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Path Suno posts completion callbacks to.
pub const CALLBACK_PATH: &str = "/suno-callback";

/// Mount the callback route (root level).
pub fn router() -> Router<AppState> {
    Router::new().route(CALLBACK_PATH, post(handlers::callback::suno_callback))
}
