//! Generation job parameters, input limits and validation.
//!
//! A [`JobParams`] is immutable once built: it travels with the pending
//! task from submission until delivery and feeds both the outbound
//! request and the final audio caption.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Input limits
// ---------------------------------------------------------------------------

/// Maximum length of a free-form song description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Maximum length of a song title, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum length of a music style, in characters.
pub const MAX_STYLE_CHARS: usize = 200;

/// Maximum length of song lyrics, in characters.
pub const MAX_LYRICS_CHARS: usize = 3000;

/// Characters that are not allowed in a title (it doubles as a file name).
static TITLE_FORBIDDEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid regex"));

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How the prompt should be interpreted by Suno.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Short description; Suno writes lyrics, title and style itself.
    Description,
    /// Full lyrics plus explicit title and style (`customMode = true`).
    Lyrics,
}

impl GenerationMode {
    /// Whether the Suno request must be sent with `customMode = true`.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Lyrics)
    }
}

/// Requested vocal gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocalGender {
    Male,
    Female,
}

impl VocalGender {
    /// Wire code used by the Suno API.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Male => "m",
            Self::Female => "f",
        }
    }

    /// Human-readable label used in captions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

/// Suno model versions the bot offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunoModel {
    V3_5,
    V4,
    V4_5,
    V4_5Plus,
    V5,
}

impl SunoModel {
    /// Every selectable model, in the order shown to the user.
    pub const ALL: [SunoModel; 5] = [
        Self::V3_5,
        Self::V4,
        Self::V4_5,
        Self::V4_5Plus,
        Self::V5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V3_5 => "V3_5",
            Self::V4 => "V4",
            Self::V4_5 => "V4_5",
            Self::V4_5Plus => "V4_5PLUS",
            Self::V5 => "V5",
        }
    }
}

impl std::fmt::Display for SunoModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SunoModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| CoreError::Validation(format!("Unknown model: {s}")))
    }
}

// ---------------------------------------------------------------------------
// JobParams
// ---------------------------------------------------------------------------

/// Parameters of one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct JobParams {
    pub mode: GenerationMode,
    /// Description text in [`GenerationMode::Description`], lyrics otherwise.
    pub prompt: String,
    /// Only sent in [`GenerationMode::Lyrics`].
    pub title: Option<String>,
    /// Only sent in [`GenerationMode::Lyrics`].
    pub style: Option<String>,
    pub vocal_gender: VocalGender,
    pub model: SunoModel,
}

impl JobParams {
    /// Build description-mode parameters, validating the description length.
    pub fn description(
        description: &str,
        vocal_gender: VocalGender,
        model: SunoModel,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            mode: GenerationMode::Description,
            prompt: validate_description(description)?,
            title: None,
            style: None,
            vocal_gender,
            model,
        })
    }

    /// Build lyrics-mode parameters, validating every field.
    pub fn lyrics(
        title: &str,
        style: &str,
        lyrics: &str,
        vocal_gender: VocalGender,
        model: SunoModel,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            mode: GenerationMode::Lyrics,
            prompt: validate_lyrics(lyrics)?,
            title: Some(validate_title(title)?),
            style: Some(validate_style(style)?),
            vocal_gender,
            model,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

fn validate_length(input: &str, max: usize, field: &str) -> Result<String, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a description, returning the trimmed text.
pub fn validate_description(input: &str) -> Result<String, CoreError> {
    validate_length(input, MAX_DESCRIPTION_CHARS, "Description")
}

/// Validate a style, returning the trimmed text.
pub fn validate_style(input: &str) -> Result<String, CoreError> {
    validate_length(input, MAX_STYLE_CHARS, "Style")
}

/// Validate lyrics, returning the trimmed text.
pub fn validate_lyrics(input: &str) -> Result<String, CoreError> {
    validate_length(input, MAX_LYRICS_CHARS, "Lyrics")
}

/// Validate a title and make it safe to use as a file name.
///
/// The length limit applies to the raw input; the result has forbidden
/// path characters stripped and dots replaced with underscores.
pub fn validate_title(input: &str) -> Result<String, CoreError> {
    let trimmed = validate_length(input, MAX_TITLE_CHARS, "Title")?;
    let sanitized = sanitize_title(&trimmed);
    if sanitized.trim().is_empty() {
        return Err(CoreError::Validation(
            "Title must contain printable characters".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Strip characters that are invalid in file names.
pub fn sanitize_title(title: &str) -> String {
    TITLE_FORBIDDEN_RE.replace_all(title, "").replace('.', "_")
}
