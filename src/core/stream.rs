//! Streamed-response aggregation.
//!
//! The aggregator folds the provider channel into a single terminal outcome.
//! Fragments accumulate in arrival order and feed a live progress view
//! (buffer plus cursor marker) that is display-only; nothing reaches the
//! store until the stream ends, errors, stalls past the timeout, or is
//! cancelled. A failed stream discards whatever partial text had accumulated
//! and yields a fixed sentinel instead, so a broken reply can never become
//! provider context.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{StreamErrorKind, StreamEvent};

/// Placeholder committed when a stream completes without yielding any text.
pub const NO_CONTENT_PLACEHOLDER: &str = "(No response.)";

/// Sentinel committed to the display transcript for a failed turn.
pub const FAILURE_SENTINEL: &str = "(No response due to API error.)";

/// Marker appended to the live progress view while text is still arriving.
pub const CURSOR_MARKER: &str = "▌";

/// Bound on how long to wait for the next fragment before failing the turn.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Terminal result of one streamed provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The fragment sequence completed normally; `text` is the full
    /// concatenation (never empty — see [`NO_CONTENT_PLACEHOLDER`]).
    Completed { text: String },

    /// The provider call failed before or during iteration. Partial text has
    /// been discarded.
    Failed { kind: StreamErrorKind, detail: String },

    /// The caller abandoned the stream; buffered text is discarded and
    /// nothing is committed.
    Cancelled,
}

pub struct StreamAggregator {
    stall_timeout: Duration,
}

impl Default for StreamAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_TIMEOUT)
    }
}

impl StreamAggregator {
    pub fn new(stall_timeout: Duration) -> Self {
        Self { stall_timeout }
    }

    /// Drain `rx` to a terminal outcome, reporting interim text through
    /// `progress`.
    ///
    /// `progress` receives the accumulated buffer with [`CURSOR_MARKER`]
    /// appended after every non-empty fragment, and the failure sentinel when
    /// the stream fails. Fragment handling is strictly sequential; the caller
    /// is suspended between fragments.
    pub async fn collect(
        &self,
        mut rx: mpsc::UnboundedReceiver<StreamEvent>,
        cancel: &CancellationToken,
        mut progress: impl FnMut(&str),
    ) -> StreamOutcome {
        let mut buffer = String::new();

        loop {
            let event = match tokio::time::timeout(self.stall_timeout, rx.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => {
                    // Channel closed without a terminal event: either the
                    // transport honored our cancellation, or it dropped the
                    // sender early.
                    if cancel.is_cancelled() {
                        return StreamOutcome::Cancelled;
                    }
                    progress(FAILURE_SENTINEL);
                    return StreamOutcome::Failed {
                        kind: StreamErrorKind::Api,
                        detail: "stream ended without a terminal event".to_string(),
                    };
                }
                Err(_) => {
                    progress(FAILURE_SENTINEL);
                    return StreamOutcome::Failed {
                        kind: StreamErrorKind::Timeout,
                        detail: format!(
                            "no fragment within {} seconds",
                            self.stall_timeout.as_secs()
                        ),
                    };
                }
            };

            match event {
                StreamEvent::Fragment(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    buffer.push_str(&text);
                    progress(&format!("{buffer}{CURSOR_MARKER}"));
                }
                StreamEvent::End => {
                    if buffer.is_empty() {
                        buffer = NO_CONTENT_PLACEHOLDER.to_string();
                    }
                    progress(&buffer);
                    return StreamOutcome::Completed { text: buffer };
                }
                StreamEvent::Error { kind, detail } => {
                    progress(FAILURE_SENTINEL);
                    return StreamOutcome::Failed { kind, detail };
                }
            }
        }
    }
}
