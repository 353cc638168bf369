//! Status query of the poll path.
//!
//! Turns the remote status into a [`PollOutcome`]. Only
//! [`PollOutcome::Terminal`] may resolve the task; the other two leave the
//! registry entry untouched.

use melody_core::completion::{CompletionPayload, Outcome};
use melody_suno::SunoApiError;

use crate::backend::GenerationBackend;

/// Status text shown when the watchdog takes over.
pub const WATCHDOG_STATUS_TEXT: &str = "Callback did not arrive, checking status...";

/// Result of one status query.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Success or failure; the task can be resolved.
    Terminal(CompletionPayload),
    /// Generation still running.
    Pending { status: String },
    /// The query itself failed; nothing is known about the task.
    Unavailable { message: String },
}

/// Query the backend once. No retry.
pub async fn poll_status(backend: &dyn GenerationBackend, task_id: &str) -> PollOutcome {
    match backend.query_status(task_id).await {
        Ok(Outcome::Pending { status }) => PollOutcome::Pending { status },
        Ok(outcome) => PollOutcome::Terminal(CompletionPayload::new(task_id, outcome)),
        Err(e) => {
            tracing::warn!(task_id, error = %e, "Status query failed");
            PollOutcome::Unavailable {
                message: api_message(&e),
            }
        }
    }
}

/// The message the API gave, without our own error prefix when possible.
fn api_message(err: &SunoApiError) -> String {
    match err {
        SunoApiError::Rejected { msg, .. } => msg.clone(),
        other => other.to_string(),
    }
}

pub fn pending_text(status: &str) -> String {
    format!("Status: {status}...")
}

pub fn api_error_text(message: &str) -> String {
    format!("API error: {message}")
}
