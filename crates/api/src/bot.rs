//! Telegram update loop.
//!
//! Long-polls `getUpdates`, keeps one [`ConversationState`] per chat and
//! renders the replies of the conversation state machine. A finished
//! request is handed to [`GenerationTracker::submit`] in its own task so a
//! slow submission does not hold up other chats.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use melody_core::conversation::{
    advance, ConversationState, Reply, ReplyKeyboard, GENERATING_TEXT, RETRY_TEXT,
};
use melody_core::job::JobParams;
use melody_core::types::{ChatId, ConversationRef};
use melody_pipeline::GenerationTracker;
use melody_telegram::{ChatTransport, ParseMode, TelegramBot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Long-poll timeout passed to `getUpdates`.
const LONG_POLL_SECS: u64 = 30;

/// Pause after a failed `getUpdates` call.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Per-chat conversation driver.
pub struct ConversationLoop {
    transport: Arc<dyn ChatTransport>,
    tracker: GenerationTracker,
    callback_url: String,
    chats: HashMap<ChatId, ConversationState>,
}

impl ConversationLoop {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        tracker: GenerationTracker,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            tracker,
            callback_url: callback_url.into(),
            chats: HashMap::new(),
        }
    }

    /// Poll for updates until `cancel` fires.
    pub async fn run(mut self, bot: TelegramBot, cancel: CancellationToken) {
        tracing::info!("Telegram update loop started");
        let mut offset: Option<i64> = None;

        loop {
            let updates = tokio::select! {
                _ = cancel.cancelled() => break,
                result = bot.get_updates(offset, LONG_POLL_SECS) => result,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => continue,
                    }
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                if let Some((chat_id, text)) = update.text_message() {
                    self.handle_message(chat_id, text).await;
                }
            }
        }

        tracing::info!("Telegram update loop stopped");
    }

    /// Feed one text message into the chat's conversation.
    ///
    /// Returns the handle of the spawned submission when the message
    /// completed a request.
    pub async fn handle_message(&mut self, chat_id: ChatId, text: &str) -> Option<JoinHandle<()>> {
        let state = self.chats.remove(&chat_id).unwrap_or_default();
        let (next, reply) = advance(state, text);
        self.chats.insert(chat_id, next);

        match reply {
            Reply::Message {
                text,
                html,
                keyboard,
            } => {
                let parse_mode = html.then_some(ParseMode::Html);
                if let Err(e) = self
                    .transport
                    .send_text(chat_id, &text, parse_mode, keyboard)
                    .await
                {
                    tracing::warn!(chat_id, error = %e, "Reply failed");
                }
                None
            }
            Reply::Submit(params) => Some(tokio::spawn(submit_job(
                Arc::clone(&self.transport),
                self.tracker.clone(),
                self.callback_url.clone(),
                chat_id,
                params,
            ))),
        }
    }

    /// Current conversation state of a chat.
    pub fn state(&self, chat_id: ChatId) -> Option<&ConversationState> {
        self.chats.get(&chat_id)
    }
}

async fn submit_job(
    transport: Arc<dyn ChatTransport>,
    tracker: GenerationTracker,
    callback_url: String,
    chat_id: ChatId,
    params: JobParams,
) {
    let status_message_id = match transport
        .send_text(chat_id, GENERATING_TEXT, None, ReplyKeyboard::Remove)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(chat_id, error = %e, "Could not post status message, request dropped");
            return;
        }
    };

    let conversation = ConversationRef::new(chat_id, status_message_id);
    if let Err(e) = tracker.submit(conversation, params, &callback_url).await {
        tracing::warn!(chat_id, error = %e, "Generation not started");
        if let Err(e) = transport
            .send_text(chat_id, RETRY_TEXT, None, ReplyKeyboard::Mode)
            .await
        {
            tracing::warn!(chat_id, error = %e, "Retry prompt failed");
        }
    }
}
