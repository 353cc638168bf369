//! Generation lifecycle coordinator.
//!
//! [`GenerationTracker`] submits jobs, registers them, arms the poll
//! watchdog and resolves each task exactly once, whether the push
//! callback or the watchdog's status query reports the result first.
//!
//! Lifecycle events are broadcast via a [`tokio::sync::broadcast`]
//! channel. Call [`GenerationTracker::subscribe`] to receive them.

use std::sync::Arc;
use std::time::Duration;

use melody_core::completion::{CompletionPayload, Outcome};
use melody_core::job::JobParams;
use melody_core::types::{ChatId, ConversationRef, TaskId};
use melody_suno::SunoApiError;
use melody_telegram::{edit_best_effort, ChatTransport};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;

use crate::backend::GenerationBackend;
use crate::deliverer::{deliver, DeliveryChannel};
use crate::poller::{api_error_text, pending_text, poll_status, PollOutcome, WATCHDOG_STATUS_TEXT};
use crate::registry::JobRegistry;
use crate::watchdog::WatchdogHandle;

/// Broadcast channel capacity for tracker events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Why a completion signal was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    /// The id was never registered here (or was forgotten).
    Unknown,
    /// The other path already resolved the task.
    AlreadyResolved,
}

impl StaleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::AlreadyResolved => "already_resolved",
        }
    }
}

/// A lifecycle event of a tracked task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TrackerEvent {
    Registered { task_id: TaskId, chat_id: ChatId },
    Pending { task_id: TaskId, status: String },
    Delivered {
        task_id: TaskId,
        chat_id: ChatId,
        channel: DeliveryChannel,
    },
    Failed {
        task_id: TaskId,
        chat_id: ChatId,
        reason: String,
    },
    Stale { task_id: TaskId, reason: StaleReason },
}

/// What happened to a completion signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Delivered(DeliveryChannel),
    /// Terminal outcome reported to the user as a failure.
    Failed { reason: String },
    /// Intermediate status; the task stays pending.
    Pending,
    Stale(StaleReason),
}

/// Answer to the push sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAck {
    /// No pending task with this id.
    Unknown,
    Received,
}

impl PushAck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Received => "received",
        }
    }
}

/// Errors that can occur when submitting a job.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The generation service refused or could not be reached.
    #[error("Submission failed: {0}")]
    Backend(#[from] SunoApiError),

    /// The service reused a task id that is still pending.
    #[error("Task {0} is already pending")]
    Duplicate(TaskId),
}

/// Coordinates submission, both completion paths and delivery.
///
/// Cheap to clone; every clone shares the same registry and event channel.
#[derive(Clone)]
pub struct GenerationTracker {
    registry: Arc<JobRegistry>,
    backend: Arc<dyn GenerationBackend>,
    transport: Arc<dyn ChatTransport>,
    poll_grace: Duration,
    event_tx: broadcast::Sender<TrackerEvent>,
    /// Push deliveries running off the request that reported them.
    deliveries: TaskTracker,
}

impl GenerationTracker {
    pub fn new(
        registry: Arc<JobRegistry>,
        backend: Arc<dyn GenerationBackend>,
        transport: Arc<dyn ChatTransport>,
        poll_grace: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            registry,
            backend,
            transport,
            poll_grace,
            event_tx,
            deliveries: TaskTracker::new(),
        }
    }

    /// Subscribe to task lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.event_tx.subscribe()
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Submit a job and start tracking it.
    ///
    /// On rejection the status message shows the error and nothing is
    /// registered.
    pub async fn submit(
        &self,
        conversation: ConversationRef,
        params: JobParams,
        callback_url: &str,
    ) -> Result<TaskId, SubmitError> {
        let task_id = match self.backend.submit(&params, callback_url).await {
            Ok(task_id) => task_id,
            Err(e) => {
                tracing::warn!(chat_id = conversation.chat_id, error = %e, "Submission rejected");
                edit_best_effort(
                    self.transport.as_ref(),
                    conversation,
                    &format!("Submission error: {}", submission_message(&e)),
                    None,
                )
                .await;
                return Err(e.into());
            }
        };

        if self
            .registry
            .register(&task_id, conversation, params)
            .is_err()
        {
            tracing::error!(task_id = %task_id, "Task id already pending");
            return Err(SubmitError::Duplicate(task_id));
        }

        tracing::info!(
            task_id = %task_id,
            chat_id = conversation.chat_id,
            grace_secs = self.poll_grace.as_secs(),
            "Task registered",
        );
        let _ = self.event_tx.send(TrackerEvent::Registered {
            task_id: task_id.clone(),
            chat_id: conversation.chat_id,
        });

        edit_best_effort(
            self.transport.as_ref(),
            conversation,
            &format!("Task submitted! ID: {task_id}\nWaiting for the result..."),
            None,
        )
        .await;

        let tracker = self.clone();
        let fired_id = task_id.clone();
        let handle = WatchdogHandle::spawn(self.poll_grace, move || async move {
            tracker.on_watchdog(&fired_id).await;
        });
        if !self.registry.attach_watchdog(&task_id, handle) {
            tracing::debug!(task_id = %task_id, "Resolved before the watchdog was attached");
        }

        Ok(task_id)
    }

    /// Push path: a normalised callback arrived.
    pub async fn handle_push(&self, payload: CompletionPayload) -> PushAck {
        tracing::info!(task_id = %payload.task_id, "Callback received");
        match self.finish(payload).await {
            Resolution::Stale(_) => PushAck::Unknown,
            _ => PushAck::Received,
        }
    }

    /// Push path for request handlers: answers at once and resolves the
    /// task in a background task, so the caller's request deadline cannot
    /// interrupt a delivery half way.
    ///
    /// Whether the task is still pending is checked up front; the
    /// background resolution re-checks through the same atomic take.
    pub fn accept_push(&self, payload: CompletionPayload) -> PushAck {
        if !self.registry.contains(&payload.task_id) {
            self.report_stale(&payload.task_id);
            return PushAck::Unknown;
        }

        let tracker = self.clone();
        self.deliveries.spawn(async move {
            tracker.handle_push(payload).await;
        });
        PushAck::Received
    }

    /// Poll path: query the task once and act on the answer.
    ///
    /// Returns `None` without a network call when the task is not pending.
    pub async fn check_status(&self, task_id: &str) -> Option<PollOutcome> {
        if !self.registry.contains(task_id) {
            self.report_stale(task_id);
            return None;
        }

        let outcome = poll_status(self.backend.as_ref(), task_id).await;
        match &outcome {
            PollOutcome::Terminal(payload) => {
                self.finish(payload.clone()).await;
            }
            PollOutcome::Pending { status } => {
                self.note_pending(task_id, status).await;
            }
            PollOutcome::Unavailable { message } => {
                // The entry stays; there is no automatic retry.
                if let Some((conversation, _)) = self.registry.snapshot(task_id) {
                    edit_best_effort(
                        self.transport.as_ref(),
                        conversation,
                        &api_error_text(message),
                        None,
                    )
                    .await;
                }
            }
        }
        Some(outcome)
    }

    /// Resolve a task from either path.
    ///
    /// `Pending` only updates the status message. A terminal outcome takes
    /// the task out of the registry; if it is already gone the signal is
    /// stale and dropped.
    pub async fn finish(&self, payload: CompletionPayload) -> Resolution {
        let CompletionPayload { task_id, outcome } = payload;

        if let Outcome::Pending { status } = &outcome {
            return self.note_pending(&task_id, status).await;
        }

        let Some(task) = self.registry.take_if_present(&task_id) else {
            return Resolution::Stale(self.report_stale(&task_id));
        };
        task.cancel_watchdog();
        let chat_id = task.conversation.chat_id;

        let track = match outcome {
            Outcome::Success(track) => track,
            Outcome::Failed { reason } => {
                tracing::warn!(task_id = %task_id, chat_id, reason = %reason, "Generation failed");
                edit_best_effort(
                    self.transport.as_ref(),
                    task.conversation,
                    &format!("Generation failed: {reason}"),
                    None,
                )
                .await;
                return self.report_failed(task_id, chat_id, reason);
            }
            Outcome::Pending { .. } => return Resolution::Pending,
        };

        let bytes = match self.backend.fetch_audio(&track.audio_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(task_id = %task_id, chat_id, error = %e, "Audio download failed");
                edit_best_effort(
                    self.transport.as_ref(),
                    task.conversation,
                    "Audio download failed",
                    None,
                )
                .await;
                return self.report_failed(task_id, chat_id, e.to_string());
            }
        };

        match deliver(
            self.transport.as_ref(),
            task.conversation,
            &track,
            bytes,
            &task.params,
        )
        .await
        {
            Some(channel) => {
                tracing::info!(
                    task_id = %task_id,
                    chat_id,
                    channel = ?channel,
                    age_secs = (chrono::Utc::now() - task.registered_at).num_seconds(),
                    "Track delivered",
                );
                let _ = self.event_tx.send(TrackerEvent::Delivered {
                    task_id,
                    chat_id,
                    channel,
                });
                Resolution::Delivered(channel)
            }
            None => self.report_failed(task_id, chat_id, "delivery failed".to_string()),
        }
    }

    /// Wait until every push delivery started by [`accept_push`](Self::accept_push)
    /// has finished.
    pub async fn wait_for_deliveries(&self) {
        self.deliveries.close();
        tracing::info!(in_flight = self.deliveries.len(), "Waiting for push deliveries");
        self.deliveries.wait().await;
    }

    /// Cancel every outstanding watchdog and forget all pending tasks.
    pub fn shutdown(&self) {
        let drained = self.registry.drain();
        tracing::info!(count = drained.len(), "Generation tracker shut down");
    }

    // ---- private helpers ----

    async fn on_watchdog(&self, task_id: &str) {
        let Some((conversation, _)) = self.registry.snapshot(task_id) else {
            tracing::debug!(task_id, "Watchdog fired after resolution");
            return;
        };
        tracing::info!(task_id, "Callback did not arrive, polling status");
        edit_best_effort(
            self.transport.as_ref(),
            conversation,
            WATCHDOG_STATUS_TEXT,
            None,
        )
        .await;
        self.check_status(task_id).await;
    }

    async fn note_pending(&self, task_id: &str, status: &str) -> Resolution {
        let Some((conversation, _)) = self.registry.snapshot(task_id) else {
            return Resolution::Stale(self.report_stale(task_id));
        };
        tracing::debug!(task_id, status, "Task still running");
        edit_best_effort(
            self.transport.as_ref(),
            conversation,
            &pending_text(status),
            None,
        )
        .await;
        let _ = self.event_tx.send(TrackerEvent::Pending {
            task_id: task_id.to_string(),
            status: status.to_string(),
        });
        Resolution::Pending
    }

    fn report_stale(&self, task_id: &str) -> StaleReason {
        let reason = if self.registry.was_resolved(task_id) {
            StaleReason::AlreadyResolved
        } else {
            StaleReason::Unknown
        };
        tracing::info!(task_id, reason = reason.as_str(), "Stale completion signal ignored");
        let _ = self.event_tx.send(TrackerEvent::Stale {
            task_id: task_id.to_string(),
            reason,
        });
        reason
    }

    fn report_failed(&self, task_id: TaskId, chat_id: ChatId, reason: String) -> Resolution {
        let _ = self.event_tx.send(TrackerEvent::Failed {
            task_id,
            chat_id,
            reason: reason.clone(),
        });
        Resolution::Failed { reason }
    }
}

fn submission_message(err: &SunoApiError) -> String {
    match err {
        SunoApiError::Rejected { msg, .. } => msg.clone(),
        other => other.to_string(),
    }
}
