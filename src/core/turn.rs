//! Per-turn synchronization of the two transcripts.
//!
//! A turn walks `AwaitingUser → UserRecorded → AwaitingProvider` and ends in
//! `Completed` or `Failed`. The central invariant lives here: a successful
//! turn appends the assistant text to both transcripts, while a failed turn
//! appends the sentinel to the display transcript only, leaving the
//! model-native history exactly as it stood after the user turn. A failed
//! reply therefore never pollutes the context sent on the next turn.

use crate::api::ChatMessage;
use crate::core::message::{DisplayTurn, Role};
use crate::core::session::Session;
use crate::core::stream::{StreamOutcome, FAILURE_SENTINEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingUser,
    UserRecorded,
    AwaitingProvider,
    Completed,
    Failed,
}

pub struct TranscriptSync {
    phase: TurnPhase,
    assistant_avatar: Option<String>,
}

impl TranscriptSync {
    pub fn new(assistant_avatar: Option<&str>) -> Self {
        Self {
            phase: TurnPhase::AwaitingUser,
            assistant_avatar: assistant_avatar.map(str::to_string),
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Append the user's message to both transcripts as one logical step.
    pub fn record_user(&mut self, session: &mut Session, content: &str) {
        debug_assert_eq!(self.phase, TurnPhase::AwaitingUser);
        session
            .display_transcript
            .push(DisplayTurn::new(Role::User, content));
        session
            .model_history
            .push(ChatMessage::new(Role::User, content));
        self.phase = TurnPhase::UserRecorded;
    }

    /// Mark the provider call as in flight.
    pub fn begin_provider(&mut self) {
        debug_assert_eq!(self.phase, TurnPhase::UserRecorded);
        self.phase = TurnPhase::AwaitingProvider;
    }

    /// Record the terminal outcome of the provider call.
    ///
    /// A cancelled stream leaves both transcripts untouched and the phase in
    /// `AwaitingProvider`; the caller decides what to do with the turn.
    pub fn record_outcome(&mut self, session: &mut Session, outcome: &StreamOutcome) -> TurnPhase {
        debug_assert_eq!(self.phase, TurnPhase::AwaitingProvider);
        match outcome {
            StreamOutcome::Completed { text } => {
                session.display_transcript.push(DisplayTurn::with_avatar(
                    Role::Assistant,
                    text,
                    self.assistant_avatar.as_deref(),
                ));
                session
                    .model_history
                    .push(ChatMessage::new(Role::Assistant, text));
                self.phase = TurnPhase::Completed;
            }
            StreamOutcome::Failed { .. } => {
                session.display_transcript.push(DisplayTurn::with_avatar(
                    Role::Assistant,
                    FAILURE_SENTINEL,
                    self.assistant_avatar.as_deref(),
                ));
                self.phase = TurnPhase::Failed;
            }
            StreamOutcome::Cancelled => {}
        }
        self.phase
    }
}
