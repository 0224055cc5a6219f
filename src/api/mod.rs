//! Provider-facing payloads and the transport seam.
//!
//! The host application owns the HTTP/SSE plumbing for whichever provider it
//! talks to. It surfaces that transport to the core by implementing
//! [`ProviderClient`], normalizing whatever the wire yields into the closed
//! [`StreamEvent`] variant before it reaches the stream aggregator.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::message::Role;

/// One turn in the exact shape a provider's context window expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Everything a provider call needs: the target model, the system prompt,
/// and the model-native history accumulated so far.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

/// Why a stream failed, as reported by the provider transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// The provider rejected the call for rate-limiting reasons, optionally
    /// hinting when a retry may succeed.
    RateLimited { retry_after_secs: Option<u64> },
    /// Any other API or transport failure.
    Api,
    /// No fragment arrived within the aggregator's stall bound. Produced
    /// locally, never by a transport.
    Timeout,
}

/// Normalized stream element delivered over the provider channel.
///
/// A well-behaved transport sends zero or more `Fragment`s followed by exactly
/// one terminal event (`End` or `Error`). Errors may arrive before any
/// fragment.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Fragment(String),
    Error { kind: StreamErrorKind, detail: String },
    End,
}

/// Transport seam implemented by the host.
///
/// `complete` spawns the provider call and returns immediately; fragments and
/// the terminal event arrive on the returned channel. Implementations should
/// stop producing (and may drop the sender without a terminal event) once
/// `cancel` fires.
pub trait ProviderClient: Send + Sync {
    fn complete(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<StreamEvent>;
}
