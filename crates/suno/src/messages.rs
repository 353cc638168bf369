//! Suno wire message types and normalisation.
//!
//! The record-info poll uses camelCase (`taskId`, `audioUrl`, `sunoData`),
//! the inbound callback uses snake_case (`task_id`, `audio_url`). Both are
//! converted into [`CompletionPayload`] here and nowhere else.

use melody_core::completion::{CompletionPayload, Outcome, TrackResult, NO_TRACKS_REASON};
use melody_core::job::JobParams;
use serde::{Deserialize, Deserializer, Serialize};

/// `code` value signalling success in every Suno response envelope.
pub const CODE_OK: i64 = 200;

/// Record-info status of a finished task.
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Record-info statuses that will never turn into a success.
pub const FAILURE_STATUSES: [&str; 4] = [
    "CREATE_TASK_FAILED",
    "GENERATE_AUDIO_FAILED",
    "CALLBACK_EXCEPTION",
    "SENSITIVE_WORD_ERROR",
];

/// Callback stage that carries the finished tracks.
pub const CALLBACK_COMPLETE: &str = "complete";

/// Title used when Suno omits one.
pub const DEFAULT_TRACK_TITLE: &str = "Suno Track";

const STYLE_WEIGHT: f64 = 0.8;
const WEIRDNESS_CONSTRAINT: f64 = 0.65;

// ---------------------------------------------------------------------------
// Outbound: job submission
// ---------------------------------------------------------------------------

/// Body of `POST /generate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub custom_mode: bool,
    pub instrumental: bool,
    pub model: &'static str,
    pub style_weight: f64,
    pub weirdness_constraint: f64,
    pub vocal_gender: &'static str,
    pub call_back_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<&'a str>,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(params: &'a JobParams, callback_url: &'a str) -> Self {
        let custom_mode = params.mode.is_custom();
        let (title, style) = if custom_mode {
            (
                Some(params.title.as_deref().unwrap_or("Suno Song")),
                Some(params.style.as_deref().unwrap_or("unknown")),
            )
        } else {
            (None, None)
        };

        Self {
            prompt: &params.prompt,
            custom_mode,
            instrumental: false,
            model: params.model.as_str(),
            style_weight: STYLE_WEIGHT,
            weirdness_constraint: WEIRDNESS_CONSTRAINT,
            vocal_gender: params.vocal_gender.as_code(),
            call_back_url: callback_url,
            title,
            style,
        }
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// `{ "code": ..., "msg": ..., "data": ... }` wrapper of every Suno response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
    pub data: Option<T>,
}

/// `data` of a successful `POST /generate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateData {
    pub task_id: String,
}

// ---------------------------------------------------------------------------
// Poll path: record-info
// ---------------------------------------------------------------------------

/// `data` of `GET /generate/record-info`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInfoData {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub response: Option<RecordResponse>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub suno_data: Vec<PolledTrack>,
}

/// Track object as returned by record-info.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolledTrack {
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<FlexibleNumber>,
}

impl RecordInfoData {
    /// Map the remote status vocabulary to an [`Outcome`].
    pub fn into_outcome(self) -> Outcome {
        if self.status == STATUS_SUCCESS {
            let first = self
                .response
                .unwrap_or_default()
                .suno_data
                .into_iter()
                .next();
            return match first {
                Some(track) => track_outcome(track.audio_url, track.title, track.duration),
                None => Outcome::Failed {
                    reason: NO_TRACKS_REASON.to_string(),
                },
            };
        }

        if FAILURE_STATUSES.contains(&self.status.as_str()) {
            let reason = self
                .error_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.status.clone());
            return Outcome::Failed { reason };
        }

        Outcome::Pending {
            status: self.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Push path: inbound callback
// ---------------------------------------------------------------------------

/// Body POSTed by Suno to the callback URL.
#[derive(Debug, Deserialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
    pub data: CallbackData,
}

#[derive(Debug, Deserialize)]
pub struct CallbackData {
    #[serde(default, rename = "callbackType")]
    pub callback_type: Option<String>,
    pub task_id: String,
    #[serde(default)]
    pub data: Option<Vec<CallbackTrack>>,
}

/// Track object as sent in callbacks.
#[derive(Debug, Deserialize)]
pub struct CallbackTrack {
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<FlexibleNumber>,
}

impl CallbackPayload {
    /// Normalise the callback into a [`CompletionPayload`].
    ///
    /// Intermediate stages (`text`, `first`) are pending; a missing stage is
    /// treated as complete.
    pub fn into_completion(self) -> CompletionPayload {
        let task_id = self.data.task_id;

        if let Some(code) = self.code {
            if code != CODE_OK {
                let reason = if self.msg.trim().is_empty() {
                    format!("generation failed with code {code}")
                } else {
                    self.msg
                };
                return CompletionPayload::new(task_id, Outcome::Failed { reason });
            }
        }

        if let Some(stage) = self.data.callback_type.as_deref() {
            if stage != CALLBACK_COMPLETE {
                return CompletionPayload::new(
                    task_id,
                    Outcome::Pending {
                        status: stage.to_string(),
                    },
                );
            }
        }

        let outcome = match self.data.data.unwrap_or_default().into_iter().next() {
            Some(track) => track_outcome(track.audio_url, track.title, track.duration),
            None => Outcome::Failed {
                reason: NO_TRACKS_REASON.to_string(),
            },
        };
        CompletionPayload::new(task_id, outcome)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read an explicit `null` as the type's default, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A number that Suno sometimes sends as a JSON string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlexibleNumber {
    Number(f64),
    Text(String),
}

impl FlexibleNumber {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }
}

fn track_outcome(
    audio_url: Option<String>,
    title: Option<String>,
    duration: Option<FlexibleNumber>,
) -> Outcome {
    let Some(audio_url) = audio_url.filter(|u| !u.trim().is_empty()) else {
        return Outcome::Failed {
            reason: "track has no audio url".to_string(),
        };
    };
    Outcome::Success(TrackResult {
        audio_url,
        title: title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TRACK_TITLE.to_string()),
        duration_seconds: duration.map(|d| d.as_f64()).unwrap_or(0.0),
    })
}
