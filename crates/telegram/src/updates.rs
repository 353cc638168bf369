//! `getUpdates` long-poll types.
//!
//! Only the fields the bot reads are modelled; everything else in the
//! update is ignored by serde.

use melody_core::types::{ChatId, MessageId};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: MessageId,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// Result object of `sendMessage` and friends; only the id is needed.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: MessageId,
}

impl Update {
    /// Chat and text of a plain text message, if this update is one.
    pub fn text_message(&self) -> Option<(ChatId, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((message.chat.id, text))
    }
}
