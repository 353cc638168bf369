//! Song-request conversation state machine.
//!
//! Pure logic: the caller keeps one [`ConversationState`] per chat, feeds
//! user text into [`advance`] and renders the returned [`Reply`]. When the
//! last question is answered the reply is [`Reply::Submit`] carrying the
//! finished [`JobParams`].

use crate::job::{
    validate_description, validate_lyrics, validate_style, validate_title, GenerationMode,
    JobParams, SunoModel, VocalGender,
};

// ---------------------------------------------------------------------------
// Button labels and prompts
// ---------------------------------------------------------------------------

pub const MODE_DESCRIPTION_LABEL: &str = "By description (short)";
pub const MODE_LYRICS_LABEL: &str = "By lyrics (full control)";
pub const GENDER_MALE_LABEL: &str = "Male voice";
pub const GENDER_FEMALE_LABEL: &str = "Female voice";

pub const WELCOME_TEXT: &str =
    "Hi! I'm <b>Suno Music Bot</b>\n\nI make music with Suno AI.\nChoose a generation mode:";
pub const AGAIN_TEXT: &str = "Done! Want another one?";
pub const RETRY_TEXT: &str = "Try again";
pub const GENERATING_TEXT: &str =
    "Generating the track... Waiting for Suno. This can take a few minutes.";

/// Keyboard to attach to a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKeyboard {
    /// Leave whatever keyboard the client shows.
    Keep,
    /// Hide the custom keyboard.
    Remove,
    Mode,
    Gender,
    Model,
}

impl ReplyKeyboard {
    /// Button rows for keyboards that show buttons.
    pub fn rows(&self) -> Option<Vec<Vec<&'static str>>> {
        match self {
            Self::Keep | Self::Remove => None,
            Self::Mode => Some(vec![vec![MODE_DESCRIPTION_LABEL], vec![MODE_LYRICS_LABEL]]),
            Self::Gender => Some(vec![vec![GENDER_MALE_LABEL], vec![GENDER_FEMALE_LABEL]]),
            Self::Model => Some(SunoModel::ALL.iter().map(|m| vec![m.as_str()]).collect()),
        }
    }
}

/// What the bot should do in response to one user message.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Send `text` (HTML allowed when `html` is set) with `keyboard`.
    Message {
        text: String,
        html: bool,
        keyboard: ReplyKeyboard,
    },
    /// All answers collected; submit the job.
    Submit(JobParams),
}

impl Reply {
    fn text(text: impl Into<String>, keyboard: ReplyKeyboard) -> Self {
        Self::Message {
            text: text.into(),
            html: false,
            keyboard,
        }
    }

    fn html(text: impl Into<String>, keyboard: ReplyKeyboard) -> Self {
        Self::Message {
            text: text.into(),
            html: true,
            keyboard,
        }
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Answers collected so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub mode: Option<GenerationMode>,
    pub prompt: Option<String>,
    pub title: Option<String>,
    pub style: Option<String>,
    pub vocal_gender: Option<VocalGender>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConversationState {
    /// No conversation started; only `/start` is understood.
    #[default]
    Idle,
    ChoosingMode,
    InputDescription(Draft),
    InputTitle(Draft),
    InputStyle(Draft),
    InputLyrics(Draft),
    ChoosingGender(Draft),
    ChoosingModel(Draft),
}

/// Reset the conversation and greet the user.
pub fn start() -> (ConversationState, Reply) {
    (
        ConversationState::ChoosingMode,
        Reply::html(WELCOME_TEXT, ReplyKeyboard::Mode),
    )
}

/// Feed one user message into the conversation.
///
/// Invalid input keeps the current state and explains the problem. After
/// [`Reply::Submit`] the conversation returns to mode selection so the
/// follow-up keyboard works.
pub fn advance(state: ConversationState, input: &str) -> (ConversationState, Reply) {
    let input = input.trim();
    if input == "/start" {
        return start();
    }

    match state {
        ConversationState::Idle => (
            ConversationState::Idle,
            Reply::text("Send /start to begin.", ReplyKeyboard::Keep),
        ),
        ConversationState::ChoosingMode => choose_mode(input),
        ConversationState::InputDescription(draft) => match validate_description(input) {
            Ok(prompt) => ask_gender(Draft {
                prompt: Some(prompt),
                ..draft
            }),
            Err(e) => rejected(ConversationState::InputDescription(draft), e),
        },
        ConversationState::InputTitle(draft) => match validate_title(input) {
            Ok(title) => (
                ConversationState::InputStyle(Draft {
                    title: Some(title),
                    ..draft
                }),
                Reply::html(
                    "What <b>music style</b>? (up to 200 characters):",
                    ReplyKeyboard::Keep,
                ),
            ),
            Err(e) => rejected(ConversationState::InputTitle(draft), e),
        },
        ConversationState::InputStyle(draft) => match validate_style(input) {
            Ok(style) => (
                ConversationState::InputLyrics(Draft {
                    style: Some(style),
                    ..draft
                }),
                Reply::html(
                    "Send the <b>song lyrics</b> (up to 3000 characters):",
                    ReplyKeyboard::Keep,
                ),
            ),
            Err(e) => rejected(ConversationState::InputStyle(draft), e),
        },
        ConversationState::InputLyrics(draft) => match validate_lyrics(input) {
            Ok(prompt) => ask_gender(Draft {
                prompt: Some(prompt),
                ..draft
            }),
            Err(e) => rejected(ConversationState::InputLyrics(draft), e),
        },
        ConversationState::ChoosingGender(draft) => {
            let gender = match input {
                GENDER_MALE_LABEL => VocalGender::Male,
                GENDER_FEMALE_LABEL => VocalGender::Female,
                _ => {
                    return (
                        ConversationState::ChoosingGender(draft),
                        Reply::text("Pick a voice using the buttons.", ReplyKeyboard::Gender),
                    )
                }
            };
            (
                ConversationState::ChoosingModel(Draft {
                    vocal_gender: Some(gender),
                    ..draft
                }),
                Reply::text("Choose a model:", ReplyKeyboard::Model),
            )
        }
        ConversationState::ChoosingModel(draft) => match input.parse::<SunoModel>() {
            Ok(model) => match finish(&draft, model) {
                Some(params) => (ConversationState::ChoosingMode, Reply::Submit(params)),
                None => start(),
            },
            Err(_) => (
                ConversationState::ChoosingModel(draft),
                Reply::text("Pick a model using the buttons.", ReplyKeyboard::Model),
            ),
        },
    }
}

fn choose_mode(input: &str) -> (ConversationState, Reply) {
    match input {
        MODE_DESCRIPTION_LABEL => (
            ConversationState::InputDescription(Draft {
                mode: Some(GenerationMode::Description),
                ..Draft::default()
            }),
            Reply::html(
                "Send a <b>song description</b> (up to 500 characters):",
                ReplyKeyboard::Remove,
            ),
        ),
        MODE_LYRICS_LABEL => (
            ConversationState::InputTitle(Draft {
                mode: Some(GenerationMode::Lyrics),
                ..Draft::default()
            }),
            Reply::html(
                "Send the <b>song title</b> (up to 100 characters):",
                ReplyKeyboard::Remove,
            ),
        ),
        _ => (
            ConversationState::ChoosingMode,
            Reply::text("Pick a mode using the buttons.", ReplyKeyboard::Mode),
        ),
    }
}

fn ask_gender(draft: Draft) -> (ConversationState, Reply) {
    (
        ConversationState::ChoosingGender(draft),
        Reply::text("Choose a voice:", ReplyKeyboard::Gender),
    )
}

fn rejected(state: ConversationState, err: crate::error::CoreError) -> (ConversationState, Reply) {
    let text = match err {
        crate::error::CoreError::Validation(msg) | crate::error::CoreError::Conflict(msg) => msg,
    };
    (state, Reply::text(text, ReplyKeyboard::Keep))
}

/// Assemble the final parameters. Returns `None` if the draft is
/// incomplete, which only happens if states were constructed by hand.
fn finish(draft: &Draft, model: SunoModel) -> Option<JobParams> {
    let mode = draft.mode?;
    let prompt = draft.prompt.clone()?;
    let vocal_gender = draft.vocal_gender?;
    Some(JobParams {
        mode,
        prompt,
        title: draft.title.clone(),
        style: draft.style.clone(),
        vocal_gender,
        model,
    })
}
