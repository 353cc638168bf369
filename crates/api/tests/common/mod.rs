#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use melody_core::completion::Outcome;
use melody_core::conversation::ReplyKeyboard;
use melody_core::job::JobParams;
use melody_core::types::{ChatId, MessageId, TaskId};
use melody_pipeline::{GenerationBackend, GenerationTracker, JobRegistry};
use melody_suno::SunoApiError;
use melody_telegram::{AudioUpload, ChatError, ChatTransport, ParseMode};
use tower::ServiceExt;

use melody_api::config::ServerConfig;
use melody_api::router::build_app_router;
use melody_api::state::AppState;

pub const CALLBACK_URL: &str = "https://bot.example/suno-callback";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        bot_token: "123:test".to_string(),
        suno_api_key: "sk-test".to_string(),
        callback_url: CALLBACK_URL.to_string(),
        suno_base_url: "http://127.0.0.1:9".to_string(),
        telegram_api_url: "http://127.0.0.1:9".to_string(),
        poll_grace_secs: 180,
        audio_fetch_timeout_secs: 5,
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Backend that hands out sequential task ids and serves fixed audio bytes.
#[derive(Default)]
pub struct StubBackend {
    next_task: AtomicUsize,
    /// Reject every submission with this message.
    pub reject_with: Option<String>,
    pub status_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl StubBackend {
    pub fn rejecting(msg: &str) -> Self {
        Self {
            reject_with: Some(msg.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn submit(&self, _: &JobParams, _: &str) -> Result<TaskId, SunoApiError> {
        if let Some(msg) = &self.reject_with {
            return Err(SunoApiError::Rejected {
                code: 400,
                msg: msg.clone(),
            });
        }
        let n = self.next_task.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("task-{n}"))
    }

    async fn query_status(&self, _: &str) -> Result<Outcome, SunoApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::Pending {
            status: "PENDING".to_string(),
        })
    }

    async fn fetch_audio(&self, _: &str) -> Result<Vec<u8>, SunoApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0xFF, 0xFB, 0x90])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        keyboard: ReplyKeyboard,
    },
    Edit {
        message_id: MessageId,
        text: String,
    },
    Delete {
        message_id: MessageId,
    },
    Audio {
        chat_id: ChatId,
        caption: String,
    },
    Document {
        chat_id: ChatId,
    },
}

/// Transport that records everything and always succeeds.
pub struct MemoryTransport {
    sent: Mutex<Vec<Sent>>,
    next_message_id: AtomicI64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(500),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn audio_count(&self) -> usize {
        self.sent()
            .iter()
            .filter(|s| matches!(s, Sent::Audio { .. }))
            .count()
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        _: Option<ParseMode>,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageId, ChatError> {
        self.push(Sent::Text {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_text(
        &self,
        _: ChatId,
        message_id: MessageId,
        text: &str,
        _: Option<ParseMode>,
    ) -> Result<(), ChatError> {
        self.push(Sent::Edit {
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, _: ChatId, message_id: MessageId) -> Result<(), ChatError> {
        self.push(Sent::Delete { message_id });
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        _: &AudioUpload,
        caption: &str,
        _: Option<ParseMode>,
    ) -> Result<(), ChatError> {
        self.push(Sent::Audio {
            chat_id,
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        _: &str,
        _: &[u8],
        _: &str,
    ) -> Result<(), ChatError> {
        self.push(Sent::Document { chat_id });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App wiring
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub tracker: GenerationTracker,
    pub backend: Arc<StubBackend>,
    pub transport: Arc<MemoryTransport>,
}

/// Build the full application router over in-memory fakes.
///
/// Uses the same [`build_app_router`] as `main.rs`, so the middleware
/// stack under test is the production one.
pub fn build_test_app() -> TestApp {
    build_test_app_with(StubBackend::default())
}

pub fn build_test_app_with(backend: StubBackend) -> TestApp {
    let config = test_config();
    let backend = Arc::new(backend);
    let transport = Arc::new(MemoryTransport::new());
    let tracker = GenerationTracker::new(
        Arc::new(JobRegistry::new()),
        backend.clone(),
        transport.clone(),
        Duration::from_secs(config.poll_grace_secs),
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        tracker: tracker.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        tracker,
        backend,
        transport,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response {
    post_raw(app, uri, json.to_string()).await
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a 200 response and return its JSON body.
pub async fn ok_json(response: Response) -> serde_json::Value {
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}
