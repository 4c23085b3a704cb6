//! What gets shown on the presence card

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shelfsync_core::Book;

/// Discord rejects text fields outside 2..=128 characters
const MAX_TEXT_CHARS: usize = 128;
const MIN_TEXT_CHARS: usize = 2;
/// Button labels are limited to 32 characters
const MAX_LABEL_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceButton {
    pub label: String,
    pub url: String,
}

/// One presence update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    /// Book title
    pub details: String,
    /// "by {author}"
    pub state: String,
    /// Cover URL or the placeholder asset key
    pub large_image: String,
    /// Platform label
    pub large_text: String,
    /// Reading start, epoch seconds
    pub start: Option<i64>,
    pub buttons: Vec<PresenceButton>,
}

impl PresencePayload {
    /// Builds the payload for a book
    ///
    /// An unparseable start date leaves `start` empty.
    pub fn for_book(book: &Book, placeholder_image: &str, profile_url: Option<String>) -> Self {
        let large_image = book
            .cover_art
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(placeholder_image)
            .to_string();

        let buttons = profile_url
            .filter(|url| !url.is_empty())
            .map(|url| {
                vec![PresenceButton {
                    label: book.platform.button_label(),
                    url,
                }]
            })
            .unwrap_or_default();

        Self {
            details: book.title.clone(),
            state: format!("by {}", book.author),
            large_image,
            large_text: book.platform.label().to_string(),
            start: book.started_at(),
            buttons,
        }
    }

    /// Activity object in Discord's SET_ACTIVITY shape
    ///
    /// Blank text fields are left out rather than padded.
    pub fn to_activity(&self) -> Value {
        let mut activity = Map::new();
        if let Some(details) = fit_text(&self.details) {
            activity.insert("details".into(), json!(details));
        }
        if let Some(state) = fit_text(&self.state) {
            activity.insert("state".into(), json!(state));
        }

        let mut assets = Map::new();
        assets.insert("large_image".into(), json!(self.large_image));
        if let Some(large_text) = fit_text(&self.large_text) {
            assets.insert("large_text".into(), json!(large_text));
        }
        activity.insert("assets".into(), Value::Object(assets));

        if let Some(start) = self.start {
            activity.insert("timestamps".into(), json!({ "start": start }));
        }
        if !self.buttons.is_empty() {
            let buttons: Vec<Value> = self
                .buttons
                .iter()
                .take(2)
                .map(|b| json!({ "label": truncate(&b.label, MAX_LABEL_CHARS), "url": b.url }))
                .collect();
            activity.insert("buttons".into(), Value::Array(buttons));
        }
        Value::Object(activity)
    }
}

/// Trims and bounds a text field; `None` for blank text
fn fit_text(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let text = truncate(text, MAX_TEXT_CHARS);
    if text.chars().count() < MIN_TEXT_CHARS {
        Some(format!("{:<width$}", text, width = MIN_TEXT_CHARS))
    } else {
        Some(text)
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}
