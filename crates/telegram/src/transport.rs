//! Chat transport contract.
//!
//! The pipeline only talks to the chat through [`ChatTransport`] so tests
//! can substitute an in-memory recorder for the real Bot API.

use async_trait::async_trait;
use melody_core::conversation::ReplyKeyboard;
use melody_core::types::{ChatId, ConversationRef, MessageId};

/// Text formatting understood by the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Html,
    MarkdownV2,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::MarkdownV2 => "MarkdownV2",
        }
    }
}

/// An audio file ready to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub title: String,
    pub performer: String,
    pub duration_secs: u32,
}

/// Errors from chat delivery primitives.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The HTTP request itself failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The chat API answered with `ok: false`.
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    /// The chat API answered `ok: true` without a usable result.
    #[error("Unexpected Telegram response: {0}")]
    UnexpectedResponse(String),
}

impl ChatError {
    /// Whether the chat rejected the message markup.
    pub fn is_formatting(&self) -> bool {
        match self {
            Self::Api { description, .. } => {
                let d = description.to_lowercase();
                d.contains("can't parse entities") || d.contains("can't find end of")
            }
            _ => false,
        }
    }

    /// Edit failures that just mean there is nothing to do.
    pub fn is_benign_edit(&self) -> bool {
        match self {
            Self::Api { description, .. } => {
                let d = description.to_lowercase();
                d.contains("not found") || d.contains("not modified")
            }
            _ => false,
        }
    }
}

/// Presentation primitives used by the pipeline and the conversation loop.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message and return its id.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageId, ChatError>;

    /// Replace the text of an existing message.
    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), ChatError>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId)
        -> Result<(), ChatError>;

    /// Send audio with a caption.
    async fn send_audio(
        &self,
        chat_id: ChatId,
        audio: &AudioUpload,
        caption: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), ChatError>;

    /// Send raw bytes as a generic file attachment.
    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: &[u8],
        caption: &str,
    ) -> Result<(), ChatError>;
}

/// Edit the status message of a conversation, swallowing every failure.
///
/// "Not found" and "not modified" are expected and not logged.
pub async fn edit_best_effort(
    transport: &dyn ChatTransport,
    conversation: ConversationRef,
    text: &str,
    parse_mode: Option<ParseMode>,
) {
    if let Err(e) = transport
        .edit_text(
            conversation.chat_id,
            conversation.status_message_id,
            text,
            parse_mode,
        )
        .await
    {
        if !e.is_benign_edit() {
            tracing::warn!(
                chat_id = conversation.chat_id,
                message_id = conversation.status_message_id,
                error = %e,
                "Status edit failed",
            );
        }
    }
}
