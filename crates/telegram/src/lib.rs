//! Telegram conversation delivery surface.
//!
//! - [`ChatTransport`]: the presentation primitives the pipeline relies
//!   on (send, edit, delete, audio, document), each independently fallible.
//! - [`TelegramBot`]: the Bot API implementation over [`reqwest`].
//! - [`keyboard`]: reply-keyboard markup.
//! - [`updates`]: `getUpdates` long-poll types.

pub mod bot;
pub mod keyboard;
pub mod transport;
pub mod updates;

pub use bot::TelegramBot;
pub use transport::{edit_best_effort, AudioUpload, ChatError, ChatTransport, ParseMode};
