//! Session lifecycle orchestration.
//!
//! The controller owns exactly one active [`Session`] per logical client
//! connection and drives the other components for it: recording turns
//! through [`TranscriptSync`], folding provider streams through
//! [`StreamAggregator`], and persisting through [`SessionStore`] after the
//! user turn and after every terminal outcome. Recoverable conditions
//! (corrupt storage, missing prompt asset) become warnings the host can
//! render as banners; nothing here terminates the application.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{CompletionRequest, ProviderClient, StreamErrorKind};
use crate::core::config::Config;
use crate::core::session::Session;
use crate::core::stream::{StreamAggregator, StreamOutcome, DEFAULT_STALL_TIMEOUT};
use crate::core::title::{self, DEFAULT_TITLE};
use crate::core::turn::TranscriptSync;
use crate::storage::atomic::WriteError;
use crate::storage::store::{Catalog, SessionStore};

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// What a call to [`ChatLifecycleController::submit`] amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only prompt; no turn was started.
    Ignored,
    /// The assistant reply was committed to both transcripts.
    Completed,
    /// The turn failed; the display transcript carries the sentinel.
    Failed { kind: StreamErrorKind, detail: String },
    /// The stream was abandoned; only the user turn was committed.
    Cancelled,
}

pub struct ChatLifecycleController {
    store: SessionStore,
    provider: Arc<dyn ProviderClient>,
    aggregator: StreamAggregator,
    model: String,
    system_prompt: String,
    assistant_avatar: Option<String>,
    intro_message: Option<String>,
    session: Session,
    title_customized: bool,
    warnings: Vec<String>,
    stream_cancel_token: Option<CancellationToken>,
}

impl ChatLifecycleController {
    pub fn new(store: SessionStore, provider: Arc<dyn ProviderClient>, config: &Config) -> Self {
        let (system_prompt, prompt_warning) = config.system_prompt();
        let stall_timeout = config
            .stream_stall_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STALL_TIMEOUT);

        let id = store.new_id();
        let mut session = Session::empty(id, DEFAULT_TITLE);
        if let Some(intro) = &config.intro_message {
            session.seed_intro(intro, config.assistant_avatar.as_deref());
        }

        Self {
            store,
            provider,
            aggregator: StreamAggregator::new(stall_timeout),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.into()),
            system_prompt,
            assistant_avatar: config.assistant_avatar.clone(),
            intro_message: config.intro_message.clone(),
            session,
            title_customized: false,
            warnings: prompt_warning.into_iter().collect(),
            stream_cancel_token: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Non-fatal warnings accumulated since the last call, for banner display.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Flush the active session, then activate an empty session under a fresh
    /// id.
    pub fn start_new(&mut self) -> Result<(), WriteError> {
        self.flush()?;
        let id = self.store.new_id();
        self.session = Session::empty(id, DEFAULT_TITLE);
        if let Some(intro) = &self.intro_message {
            self.session
                .seed_intro(intro, self.assistant_avatar.as_deref());
        }
        self.title_customized = false;
        Ok(())
    }

    /// Flush the active session, then load and activate `id`.
    pub fn select(&mut self, id: &str) -> Result<(), WriteError> {
        self.flush()?;
        let (mut session, load_warning) = self.store.load(id);
        if let Some(warning) = load_warning {
            self.warnings
                .push(format!("Could not restore chat history, starting fresh. ({warning})"));
        }
        if let Some(intro) = &self.intro_message {
            session.seed_intro(intro, self.assistant_avatar.as_deref());
        }
        self.session = session;
        self.title_customized = false;
        Ok(())
    }

    /// Catalog of past sessions for the selector, pruned lazily.
    pub fn catalog(&self) -> Catalog {
        self.store.list()
    }

    /// Set the session title directly, bypassing derivation, and persist the
    /// catalog update. Blank titles are ignored so a title is never empty.
    pub fn rename(&mut self, new_title: &str) -> Result<(), WriteError> {
        let trimmed = new_title.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        self.session.title = trimmed.to_string();
        self.title_customized = true;
        self.store.save(&self.session)
    }

    /// Cancel the in-flight provider stream, if any. Buffered-but-uncommitted
    /// fragment text is discarded.
    pub fn cancel_active_stream(&mut self) {
        if let Some(token) = self.stream_cancel_token.take() {
            token.cancel();
        }
    }

    /// Drive one full turn: record the user message, stream the provider
    /// reply, record the outcome, persist.
    ///
    /// `progress` receives the live buffer-plus-cursor view while fragments
    /// arrive; it is display-only. On the very first turn of a session the
    /// title is derived from the prompt, unless it has been renamed.
    pub async fn submit(
        &mut self,
        prompt: &str,
        progress: impl FnMut(&str),
    ) -> Result<SubmitOutcome, WriteError> {
        if prompt.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        if !self.title_customized && self.session.title == DEFAULT_TITLE {
            self.session.title = title::derive(prompt, &self.session.id);
        }

        let mut sync = TranscriptSync::new(self.assistant_avatar.as_deref());
        sync.record_user(&mut self.session, prompt);
        // The user turn is durable before the provider is ever contacted.
        self.store.save(&self.session)?;

        sync.begin_provider();
        let cancel = CancellationToken::new();
        self.stream_cancel_token = Some(cancel.clone());

        let request = CompletionRequest {
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            messages: self.session.model_history.clone(),
        };
        let rx = self.provider.complete(request, cancel.clone());
        let outcome = self.aggregator.collect(rx, &cancel, progress).await;
        self.stream_cancel_token = None;

        if outcome == StreamOutcome::Cancelled {
            debug!(id = %self.session.id, "stream abandoned; discarding buffered text");
            return Ok(SubmitOutcome::Cancelled);
        }

        sync.record_outcome(&mut self.session, &outcome);
        self.store.save(&self.session)?;

        Ok(match outcome {
            StreamOutcome::Completed { .. } => SubmitOutcome::Completed,
            StreamOutcome::Failed { kind, detail } => SubmitOutcome::Failed { kind, detail },
            StreamOutcome::Cancelled => unreachable!("handled above"),
        })
    }

    fn flush(&mut self) -> Result<(), WriteError> {
        if self.session.is_empty() {
            return Ok(());
        }
        self.store.save(&self.session)
    }
}
