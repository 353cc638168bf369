//! Audio caption rendering.
//!
//! The rich caption uses Telegram MarkdownV2; the plain caption carries the
//! same four facts without any markup and is used when the rich one is
//! rejected.

use crate::job::JobParams;

/// Performer shown on delivered audio.
pub const PERFORMER: &str = "Suno AI";

/// Caption of the generic-document fallback.
pub const FALLBACK_DOCUMENT_CAPTION: &str = "Audio delivery failed";

/// Characters that must be escaped anywhere in MarkdownV2 text.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.',
    '!',
];

/// Escape text for use outside of entities in MarkdownV2.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Everything a caption is made of.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFields<'a> {
    pub title: &'a str,
    pub voice: &'a str,
    pub duration_secs: u32,
    pub model: &'a str,
}

impl<'a> CaptionFields<'a> {
    pub fn new(title: &'a str, duration_secs: u32, params: &'a JobParams) -> Self {
        Self {
            title,
            voice: params.vocal_gender.label(),
            duration_secs,
            model: params.model.as_str(),
        }
    }

    /// MarkdownV2 caption with emphasis.
    pub fn rich(&self) -> String {
        format!(
            "*{}*\n\nVoice: _{}_\nDuration: `{}s`\nModel: _{}_",
            escape_markdown_v2(self.title),
            escape_markdown_v2(self.voice),
            self.duration_secs,
            escape_markdown_v2(self.model),
        )
    }

    /// Caption without any markup.
    pub fn plain(&self) -> String {
        format!(
            "{}\nVoice: {}\nDuration: {}s\nModel: {}",
            self.title, self.voice, self.duration_secs, self.model,
        )
    }
}

/// File name used for delivered audio.
pub fn audio_file_name(title: &str) -> String {
    format!("{}.mp3", crate::job::sanitize_title(title))
}
