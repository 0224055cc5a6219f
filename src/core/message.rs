use serde::{Deserialize, Serialize};

/// Speaker of a transcript turn.
///
/// Serializes to the lowercase strings remote APIs expect, so the same enum
/// backs both the display transcript and the model-native history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// One turn in the human-facing transcript.
///
/// Unlike [`crate::api::ChatMessage`], a display turn may carry an avatar
/// reference for the renderer and may hold a failure sentinel that never
/// reaches the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl DisplayTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(role: Role, content: impl Into<String>, avatar: Option<&str>) -> Self {
        Self {
            role,
            content: content.into(),
            avatar: avatar.map(str::to_string),
        }
    }
}
