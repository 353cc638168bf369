//! Inbound Suno completion callback.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use melody_suno::messages::CallbackPayload;
use serde::Serialize;

use crate::state::AppState;

/// Acknowledgement body. The HTTP status is always 200.
#[derive(Debug, Serialize)]
pub struct CallbackAck {
    pub status: &'static str,
}

/// POST /suno-callback
///
/// Unknown and already-resolved tasks answer `unknown`. Known tasks answer
/// `received` and are resolved in the background. A body that is not a
/// callback answers `ignored`.
pub async fn suno_callback(State(state): State<AppState>, body: Bytes) -> Json<CallbackAck> {
    let payload: CallbackPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "Malformed callback body");
            return Json(CallbackAck { status: "ignored" });
        }
    };

    let completion = payload.into_completion();
    tracing::debug!(task_id = %completion.task_id, outcome = ?completion.outcome, "Callback parsed");

    let ack = state.tracker.accept_push(completion);
    Json(CallbackAck {
        status: ack.as_str(),
    })
}
