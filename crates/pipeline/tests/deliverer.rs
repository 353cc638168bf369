//! Delivery fallback chain against a recording transport.

mod common;

use common::*;
use melody_core::caption::FALLBACK_DOCUMENT_CAPTION;
use melody_core::conversation::{ReplyKeyboard, AGAIN_TEXT};
use melody_pipeline::deliverer::{deliver, DeliveryChannel};
use melody_telegram::ParseMode;

const BYTES: [u8; 4] = [1, 2, 3, 4];

fn again_prompt() -> ChatCall {
    ChatCall::SendText {
        chat_id: CHAT_ID,
        text: AGAIN_TEXT.into(),
        keyboard: ReplyKeyboard::Mode,
    }
}

#[tokio::test]
async fn rich_caption_first() {
    let transport = RecordingTransport::new();

    let channel = deliver(
        &transport,
        conversation(),
        &track("Song A", 187.4),
        BYTES.to_vec(),
        &params(),
    )
    .await;

    assert_eq!(channel, Some(DeliveryChannel::RichAudio));
    let calls = transport.calls();
    assert_eq!(
        calls[0],
        ChatCall::Delete {
            chat_id: CHAT_ID,
            message_id: STATUS_MESSAGE_ID,
        }
    );
    match &calls[1] {
        ChatCall::Audio {
            upload,
            caption,
            parse_mode,
            ..
        } => {
            assert_eq!(*parse_mode, Some(ParseMode::MarkdownV2));
            assert!(caption.starts_with("*Song A*"));
            assert_eq!(upload.file_name, "Song A.mp3");
            assert_eq!(upload.performer, "Suno AI");
            assert_eq!(upload.duration_secs, 187);
        }
        other => panic!("expected audio, got {other:?}"),
    }
    assert_eq!(calls[2], again_prompt());
}

#[tokio::test]
async fn formatting_rejection_retries_with_plain_caption() {
    let transport = RecordingTransport::new().rejecting_markdown();

    let channel = deliver(
        &transport,
        conversation(),
        &track("Song A", 187.0),
        BYTES.to_vec(),
        &params(),
    )
    .await;

    assert_eq!(channel, Some(DeliveryChannel::PlainAudio));
    match &transport.calls()[1] {
        ChatCall::Audio {
            upload,
            caption,
            parse_mode,
            ..
        } => {
            assert_eq!(*parse_mode, None);
            assert_eq!(upload.bytes, BYTES.to_vec());
            assert_eq!(caption, "Song A\nVoice: Female\nDuration: 187s\nModel: V4_5");
            assert!(!caption.contains('*') && !caption.contains('`'));
        }
        other => panic!("expected audio, got {other:?}"),
    }
    assert_eq!(transport.calls().last().unwrap(), &again_prompt());
}

#[tokio::test]
async fn audio_rejection_falls_back_to_document() {
    let transport = RecordingTransport::new().rejecting_audio();

    let channel = deliver(
        &transport,
        conversation(),
        &track("Song A", 187.0),
        BYTES.to_vec(),
        &params(),
    )
    .await;

    assert_eq!(channel, Some(DeliveryChannel::Document));
    assert_eq!(
        transport.calls()[1],
        ChatCall::Document {
            chat_id: CHAT_ID,
            file_name: "Song A.mp3".into(),
            bytes: BYTES.to_vec(),
            caption: FALLBACK_DOCUMENT_CAPTION.into(),
        }
    );
    assert_eq!(transport.calls().last().unwrap(), &again_prompt());
}

#[tokio::test]
async fn total_failure_sends_no_prompt() {
    let transport = RecordingTransport::new()
        .rejecting_audio()
        .rejecting_documents();

    let channel = deliver(
        &transport,
        conversation(),
        &track("Song A", 187.0),
        BYTES.to_vec(),
        &params(),
    )
    .await;

    assert_eq!(channel, None);
    assert_eq!(transport.deliveries(), 0);
    assert!(!transport.calls().contains(&again_prompt()));
}
