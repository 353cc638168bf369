//! Reply keyboard markup for the Bot API.

use melody_core::conversation::ReplyKeyboard;
use serde_json::{json, Value};

/// Render a keyboard as a `reply_markup` object.
///
/// [`ReplyKeyboard::Keep`] renders to `None` so the field is omitted.
pub fn reply_markup(keyboard: ReplyKeyboard) -> Option<Value> {
    if keyboard == ReplyKeyboard::Remove {
        return Some(json!({ "remove_keyboard": true }));
    }

    let rows = keyboard.rows()?;
    let buttons: Vec<Vec<Value>> = rows
        .into_iter()
        .map(|row| row.into_iter().map(|text| json!({ "text": text })).collect())
        .collect();

    Some(json!({
        "keyboard": buttons,
        "resize_keyboard": true,
        "one_time_keyboard": true,
    }))
}
