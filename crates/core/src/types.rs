/// Opaque task identifier issued by the Suno API.
pub type TaskId = String;

/// Telegram chat identifier.
pub type ChatId = i64;

/// Telegram message identifier, unique within a chat.
pub type MessageId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Where the result of a task must be delivered.
///
/// The status message is edited as the task progresses and deleted once
/// the audio is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationRef {
    pub chat_id: ChatId,
    pub status_message_id: MessageId,
}

impl ConversationRef {
    pub fn new(chat_id: ChatId, status_message_id: MessageId) -> Self {
        Self {
            chat_id,
            status_message_id,
        }
    }
}
