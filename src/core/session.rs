use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ChatMessage;
use crate::core::message::{DisplayTurn, Role};

/// One durable conversation.
///
/// A session keeps two representations of the same exchange: the
/// `display_transcript` the renderer consumes (which may include avatars and
/// failure sentinels) and the `model_history` sent back to the provider as
/// context (which never does). For every completed turn the two are
/// index-aligned; a failed turn adds a display entry with no history
/// counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub display_transcript: Vec<DisplayTurn>,
    pub model_history: Vec<ChatMessage>,
}

impl Session {
    pub fn empty(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            display_transcript: Vec::new(),
            model_history: Vec::new(),
        }
    }

    /// Creation time recovered from the id, when the id is a fractional epoch
    /// value.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_epoch_id(&self.id)
    }

    pub fn is_empty(&self) -> bool {
        self.display_transcript.is_empty() && self.model_history.is_empty()
    }

    /// Append a fixed intro message to both transcripts of a fresh session.
    ///
    /// No-op once the session holds any turn, so reloading never duplicates
    /// the greeting.
    pub fn seed_intro(&mut self, intro: &str, avatar: Option<&str>) {
        if !self.is_empty() {
            return;
        }
        self.display_transcript
            .push(DisplayTurn::with_avatar(Role::Assistant, intro, avatar));
        self.model_history
            .push(ChatMessage::new(Role::Assistant, intro));
    }
}

/// Parse an id of the form `"1700000000.123456"` (or plain seconds) into a
/// UTC timestamp.
pub(crate) fn parse_epoch_id(id: &str) -> Option<DateTime<Utc>> {
    let seconds: f64 = id.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let secs = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1_000_000_000.0).round() as u32;
    Utc.timestamp_opt(secs, nanos).single()
}
