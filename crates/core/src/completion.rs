//! Normalised completion payload.
//!
//! Both the push callback and the status poll are converted into a
//! [`CompletionPayload`] at their boundary so the rest of the pipeline
//! never sees either wire naming convention.

use crate::types::TaskId;

/// Reason used when Suno reports success but returns no tracks.
pub const NO_TRACKS_REASON: &str = "no tracks produced";

/// Metadata of the first produced track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackResult {
    pub audio_url: String,
    pub title: String,
    pub duration_seconds: f64,
}

impl TrackResult {
    /// Duration truncated to whole seconds, as shown to the user.
    pub fn whole_seconds(&self) -> u32 {
        if self.duration_seconds.is_finite() && self.duration_seconds > 0.0 {
            self.duration_seconds as u32
        } else {
            0
        }
    }
}

/// State of a task as reported by either notification path.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(TrackResult),
    /// Generation still running; carries the remote status text.
    Pending { status: String },
    Failed { reason: String },
}

/// Completion information for one task.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionPayload {
    pub task_id: TaskId,
    pub outcome: Outcome,
}

impl CompletionPayload {
    pub fn new(task_id: impl Into<TaskId>, outcome: Outcome) -> Self {
        Self {
            task_id: task_id.into(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(duration_seconds: f64) -> TrackResult {
        TrackResult {
            audio_url: "https://cdn.example/a.mp3".into(),
            title: "Song A".into(),
            duration_seconds,
        }
    }

    #[test]
    fn whole_seconds_truncates() {
        assert_eq!(track(187.4).whole_seconds(), 187);
        assert_eq!(track(187.99).whole_seconds(), 187);
    }

    #[test]
    fn whole_seconds_clamps_garbage() {
        assert_eq!(track(-3.0).whole_seconds(), 0);
        assert_eq!(track(f64::NAN).whole_seconds(), 0);
    }
}
