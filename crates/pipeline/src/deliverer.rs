//! Audio delivery with graceful degradation.
//!
//! Tries, in order: audio with the MarkdownV2 caption, audio with the
//! plain caption, the same bytes as a generic document. The first that
//! succeeds wins and is followed by the "another one?" prompt.

use melody_core::caption::{audio_file_name, CaptionFields, FALLBACK_DOCUMENT_CAPTION, PERFORMER};
use melody_core::completion::TrackResult;
use melody_core::conversation::{ReplyKeyboard, AGAIN_TEXT};
use melody_core::job::JobParams;
use melody_core::types::ConversationRef;
use melody_telegram::{AudioUpload, ChatTransport, ParseMode};
use serde::Serialize;

/// Which artifact reached the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    RichAudio,
    PlainAudio,
    Document,
}

/// Deliver a produced track to the conversation.
///
/// Returns `None` when every tier failed; the failure is logged and
/// nothing else is sent.
pub async fn deliver(
    transport: &dyn ChatTransport,
    conversation: ConversationRef,
    track: &TrackResult,
    bytes: Vec<u8>,
    params: &JobParams,
) -> Option<DeliveryChannel> {
    let chat_id = conversation.chat_id;

    // Best-effort: the status message may already be gone.
    if let Err(e) = transport
        .delete_message(chat_id, conversation.status_message_id)
        .await
    {
        tracing::debug!(chat_id, error = %e, "Status message not deleted");
    }

    let duration_secs = track.whole_seconds();
    let fields = CaptionFields::new(&track.title, duration_secs, params);
    let upload = AudioUpload {
        bytes,
        file_name: audio_file_name(&track.title),
        title: track.title.clone(),
        performer: PERFORMER.to_string(),
        duration_secs,
    };

    let channel = match transport
        .send_audio(chat_id, &upload, &fields.rich(), Some(ParseMode::MarkdownV2))
        .await
    {
        Ok(()) => Some(DeliveryChannel::RichAudio),
        Err(e) => {
            tracing::warn!(
                chat_id,
                formatting = e.is_formatting(),
                error = %e,
                "Rich caption rejected, retrying with plain caption",
            );
            match transport
                .send_audio(chat_id, &upload, &fields.plain(), None)
                .await
            {
                Ok(()) => Some(DeliveryChannel::PlainAudio),
                Err(e) => {
                    tracing::error!(chat_id, error = %e, "Audio send failed, sending as document");
                    match transport
                        .send_document(
                            chat_id,
                            &upload.file_name,
                            &upload.bytes,
                            FALLBACK_DOCUMENT_CAPTION,
                        )
                        .await
                    {
                        Ok(()) => Some(DeliveryChannel::Document),
                        Err(e) => {
                            tracing::error!(chat_id, error = %e, "Document fallback failed");
                            None
                        }
                    }
                }
            }
        }
    };

    if channel.is_some() {
        if let Err(e) = transport
            .send_text(chat_id, AGAIN_TEXT, None, ReplyKeyboard::Mode)
            .await
        {
            tracing::warn!(chat_id, error = %e, "Follow-up prompt failed");
        }
    }

    channel
}
