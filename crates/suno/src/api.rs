//! REST API client for the Suno generation endpoints.
//!
//! Wraps job submission (`POST /generate`), the status query
//! (`GET /generate/record-info`) and the plain audio download using
//! [`reqwest`].

use std::time::Duration;

use melody_core::completion::Outcome;
use melody_core::job::JobParams;
use melody_core::types::TaskId;

use crate::messages::{ApiEnvelope, GenerateData, GenerateRequest, RecordInfoData, CODE_OK};

/// Default Suno API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.sunoapi.org/api/v1";

/// Timeout for a single Suno API request.
const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for downloading a produced track.
pub const DEFAULT_AUDIO_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for [`SunoApi`].
#[derive(Debug, Clone)]
pub struct SunoConfig {
    /// Base URL, e.g. `https://api.sunoapi.org/api/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Deadline for [`SunoApi::fetch_audio`].
    pub audio_fetch_timeout: Duration,
}

impl SunoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            audio_fetch_timeout: DEFAULT_AUDIO_FETCH_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_audio_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.audio_fetch_timeout = timeout;
        self
    }
}

/// Errors from the Suno REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum SunoApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx HTTP status.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body was not the JSON shape expected.
    #[error("Failed to parse Suno response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The envelope `code` was not 200.
    #[error("Suno API error {code}: {msg}")]
    Rejected { code: i64, msg: String },

    /// A 200 envelope without the expected `data` object.
    #[error("Suno API response is missing {0}")]
    MissingData(&'static str),
}

/// HTTP client for the Suno API.
#[derive(Clone)]
pub struct SunoApi {
    client: reqwest::Client,
    config: SunoConfig,
}

impl SunoApi {
    /// Create a new API client with its own connection pool.
    pub fn new(config: SunoConfig) -> Result<Self, SunoApiError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Submit a generation job.
    ///
    /// Returns the task identifier Suno will use in the callback and in
    /// status queries.
    pub async fn submit_generation(
        &self,
        params: &JobParams,
        callback_url: &str,
    ) -> Result<TaskId, SunoApiError> {
        let body = GenerateRequest::new(params, callback_url);

        let response = self
            .client
            .post(format!("{}/generate", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(API_REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let envelope: ApiEnvelope<GenerateData> = Self::parse_response(response).await?;
        let data = Self::unwrap_envelope(envelope, "data.taskId")?;

        tracing::info!(task_id = %data.task_id, model = %params.model, "Generation submitted to Suno");
        Ok(data.task_id)
    }

    /// Query the status of a task.
    ///
    /// A non-200 envelope is returned as [`SunoApiError::Rejected`]; it is
    /// not an outcome of the task itself.
    pub async fn record_info(&self, task_id: &str) -> Result<RecordInfoData, SunoApiError> {
        let response = self
            .client
            .get(format!("{}/generate/record-info", self.config.base_url))
            .query(&[("taskId", task_id)])
            .bearer_auth(&self.config.api_key)
            .timeout(API_REQUEST_TIMEOUT)
            .send()
            .await?;

        let envelope: ApiEnvelope<RecordInfoData> = Self::parse_response(response).await?;
        tracing::debug!(task_id, code = envelope.code, "Record-info response");
        Self::unwrap_envelope(envelope, "data")
    }

    /// Query the status of a task and normalise it to an [`Outcome`].
    pub async fn query_outcome(&self, task_id: &str) -> Result<Outcome, SunoApiError> {
        Ok(self.record_info(task_id).await?.into_outcome())
    }

    /// Download a produced track with a plain GET (no auth header).
    pub async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, SunoApiError> {
        let response = self
            .client
            .get(url)
            .timeout(self.config.audio_fetch_timeout)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SunoApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SunoApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SunoApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Check the envelope code and extract `data`.
    fn unwrap_envelope<T>(
        envelope: ApiEnvelope<T>,
        what: &'static str,
    ) -> Result<T, SunoApiError> {
        if envelope.code != CODE_OK {
            let msg = if envelope.msg.is_empty() {
                "Unknown error".to_string()
            } else {
                envelope.msg
            };
            return Err(SunoApiError::Rejected {
                code: envelope.code,
                msg,
            });
        }
        envelope.data.ok_or(SunoApiError::MissingData(what))
    }
}
