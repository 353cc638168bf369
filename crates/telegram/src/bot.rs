//! Telegram Bot API client.
//!
//! JSON methods go through [`TelegramBot::call`]; file uploads use
//! multipart forms. Every response is unwrapped from the
//! `{ "ok": ..., "result": ... }` envelope into a [`ChatError`] on failure.

use std::time::Duration;

use async_trait::async_trait;
use melody_core::conversation::ReplyKeyboard;
use melody_core::types::{ChatId, MessageId};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::keyboard::reply_markup;
use crate::transport::{AudioUpload, ChatError, ChatTransport, ParseMode};
use crate::updates::{SentMessage, Update};

/// Default Bot API host.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Timeout for ordinary Bot API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for uploads, which carry whole tracks.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Extra slack on top of the long-poll timeout.
const LONG_POLL_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct BotResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client bound to one bot token.
#[derive(Clone)]
pub struct TelegramBot {
    client: reqwest::Client,
    /// `{api_url}/bot{token}`
    base: String,
}

impl TelegramBot {
    /// Build a client for the Bot API host at `api_url` ([`DEFAULT_API_URL`] in production).
    pub fn with_api_url(token: &str, api_url: &str) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    /// Long-poll for new updates.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, ChatError> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let response = self
            .client
            .post(self.url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs) + LONG_POLL_SLACK)
            .json(&body)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    /// Call a JSON Bot API method.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, ChatError> {
        let response = self
            .client
            .post(self.url(method))
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    async fn upload(&self, method: &str, form: Form) -> Result<(), ChatError> {
        let response = self
            .client
            .post(self.url(method))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        let _: Value = Self::unwrap_response(response).await?;
        Ok(())
    }

    /// Decode the envelope. The Bot API returns a JSON body with
    /// `ok: false` on 4xx, so the body is read regardless of status.
    async fn unwrap_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ChatError> {
        let status = response.status();
        let envelope: BotResponse<T> = response.json().await.map_err(|e| {
            if status.is_success() {
                ChatError::UnexpectedResponse(e.to_string())
            } else {
                ChatError::Api {
                    code: i64::from(status.as_u16()),
                    description: status.to_string(),
                }
            }
        })?;

        if !envelope.ok {
            return Err(ChatError::Api {
                code: envelope.error_code.unwrap_or(i64::from(status.as_u16())),
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope
            .result
            .ok_or_else(|| ChatError::UnexpectedResponse("missing result".to_string()))
    }
}

#[async_trait]
impl ChatTransport for TelegramBot {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageId, ChatError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode.as_str());
        }
        if let Some(markup) = reply_markup(keyboard) {
            body["reply_markup"] = markup;
        }
        let sent: SentMessage = self.call("sendMessage", &body).await?;
        Ok(sent.message_id)
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), ChatError> {
        let mut body = json!({ "chat_id": chat_id, "message_id": message_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode.as_str());
        }
        // Result is the edited Message, or `true` for inline messages.
        let _: Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChatError> {
        let _: bool = self
            .call(
                "deleteMessage",
                &json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        audio: &AudioUpload,
        caption: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), ChatError> {
        let part = Part::bytes(audio.bytes.clone())
            .file_name(audio.file_name.clone())
            .mime_str("audio/mpeg")?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("title", audio.title.clone())
            .text("performer", audio.performer.clone())
            .text("duration", audio.duration_secs.to_string())
            .text("caption", caption.to_string())
            .part("audio", part);
        if let Some(mode) = parse_mode {
            form = form.text("parse_mode", mode.as_str());
        }
        self.upload("sendAudio", form).await
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: &[u8],
        caption: &str,
    ) -> Result<(), ChatError> {
        let part = Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);
        self.upload("sendDocument", form).await
    }
}
