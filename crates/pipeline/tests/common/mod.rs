//! Shared fakes for pipeline integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use melody_core::completion::{CompletionPayload, Outcome, TrackResult};
use melody_core::conversation::ReplyKeyboard;
use melody_core::job::{JobParams, SunoModel, VocalGender};
use melody_core::types::{ChatId, ConversationRef, MessageId, TaskId};
use melody_pipeline::{GenerationBackend, GenerationTracker, JobRegistry};
use melody_suno::SunoApiError;
use melody_telegram::{AudioUpload, ChatError, ChatTransport, ParseMode};

pub const CHAT_ID: ChatId = 4242;
pub const STATUS_MESSAGE_ID: MessageId = 7;
pub const CALLBACK_URL: &str = "https://bot.example/suno-callback";
pub const GRACE: Duration = Duration::from_secs(180);

pub fn conversation() -> ConversationRef {
    ConversationRef::new(CHAT_ID, STATUS_MESSAGE_ID)
}

pub fn params() -> JobParams {
    JobParams::description("a calm song about the sea", VocalGender::Female, SunoModel::V4_5)
        .unwrap()
}

pub fn track(title: &str, duration_seconds: f64) -> TrackResult {
    TrackResult {
        audio_url: format!("https://cdn.example/{title}.mp3"),
        title: title.to_string(),
        duration_seconds,
    }
}

pub fn success(task_id: &str, title: &str, duration_seconds: f64) -> CompletionPayload {
    CompletionPayload::new(task_id, Outcome::Success(track(title, duration_seconds)))
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Scripted generation backend that counts every call.
#[derive(Default)]
pub struct FakeBackend {
    submit_results: Mutex<VecDeque<Result<TaskId, SunoApiError>>>,
    status_results: Mutex<VecDeque<Result<Outcome, SunoApiError>>>,
    /// `None` makes downloads fail with HTTP 404.
    audio: Mutex<Option<Vec<u8>>>,
    fetch_delay: Mutex<Duration>,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        *backend.audio.lock().unwrap() = Some(vec![0xFF, 0xFB, 0x90, 0x44]);
        backend
    }

    pub fn with_task_id(self, task_id: &str) -> Self {
        self.submit_results
            .lock()
            .unwrap()
            .push_back(Ok(task_id.to_string()));
        self
    }

    pub fn with_submit_error(self, err: SunoApiError) -> Self {
        self.submit_results.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_status(self, result: Result<Outcome, SunoApiError>) -> Self {
        self.status_results.lock().unwrap().push_back(result);
        self
    }

    pub fn without_audio(self) -> Self {
        *self.audio.lock().unwrap() = None;
        self
    }

    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        *self.fetch_delay.lock().unwrap() = delay;
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn submit(&self, _: &JobParams, _: &str) -> Result<TaskId, SunoApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("task-default".to_string()))
    }

    async fn query_status(&self, _: &str) -> Result<Outcome, SunoApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(Outcome::Pending {
                    status: "PENDING".to_string(),
                })
            })
    }

    async fn fetch_audio(&self, _: &str) -> Result<Vec<u8>, SunoApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let audio = self.audio.lock().unwrap().clone();
        audio.ok_or(SunoApiError::HttpStatus {
            status: 404,
            body: "not found".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Chat transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCall {
    SendText {
        chat_id: ChatId,
        text: String,
        keyboard: ReplyKeyboard,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
    Audio {
        chat_id: ChatId,
        upload: AudioUpload,
        caption: String,
        parse_mode: Option<ParseMode>,
    },
    Document {
        chat_id: ChatId,
        file_name: String,
        bytes: Vec<u8>,
        caption: String,
    },
}

/// Records every chat call; failures are opt-in.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<ChatCall>>,
    next_message_id: AtomicI64,
    /// Reject MarkdownV2 audio captions as unparsable.
    reject_markdown: bool,
    /// Reject every audio upload.
    reject_audio: bool,
    reject_document: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(100),
            ..Self::default()
        }
    }

    pub fn rejecting_markdown(mut self) -> Self {
        self.reject_markdown = true;
        self
    }

    pub fn rejecting_audio(mut self) -> Self {
        self.reject_audio = true;
        self
    }

    pub fn rejecting_documents(mut self) -> Self {
        self.reject_document = true;
        self
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn edit_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChatCall::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Successful audio and document sends.
    pub fn deliveries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ChatCall::Audio { .. } | ChatCall::Document { .. }))
            .count()
    }

    pub fn audio_captions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChatCall::Audio { caption, .. } => Some(caption),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ChatCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn api_error(description: &str) -> ChatError {
    ChatError::Api {
        code: 400,
        description: description.to_string(),
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        _parse_mode: Option<ParseMode>,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageId, ChatError> {
        self.record(ChatCall::SendText {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        _parse_mode: Option<ParseMode>,
    ) -> Result<(), ChatError> {
        self.record(ChatCall::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), ChatError> {
        self.record(ChatCall::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        audio: &AudioUpload,
        caption: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), ChatError> {
        if self.reject_audio {
            return Err(api_error("Bad Request: file is too big"));
        }
        if self.reject_markdown && parse_mode == Some(ParseMode::MarkdownV2) {
            return Err(api_error(
                "Bad Request: can't parse entities: Character '.' is reserved",
            ));
        }
        self.record(ChatCall::Audio {
            chat_id,
            upload: audio.clone(),
            caption: caption.to_string(),
            parse_mode,
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: &[u8],
        caption: &str,
    ) -> Result<(), ChatError> {
        if self.reject_document {
            return Err(api_error("Bad Request: file is too big"));
        }
        self.record(ChatCall::Document {
            chat_id,
            file_name: file_name.to_string(),
            bytes: bytes.to_vec(),
            caption: caption.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub tracker: GenerationTracker,
    pub backend: Arc<FakeBackend>,
    pub transport: Arc<RecordingTransport>,
    pub registry: Arc<JobRegistry>,
}

pub fn harness(backend: FakeBackend) -> Harness {
    harness_with(backend, RecordingTransport::new())
}

pub fn harness_with(backend: FakeBackend, transport: RecordingTransport) -> Harness {
    let backend = Arc::new(backend);
    let transport = Arc::new(transport);
    let registry = Arc::new(JobRegistry::new());
    let tracker = GenerationTracker::new(
        Arc::clone(&registry),
        backend.clone(),
        transport.clone(),
        GRACE,
    );
    Harness {
        tracker,
        backend,
        transport,
        registry,
    }
}
