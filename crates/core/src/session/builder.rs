use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoff;
use tripwhisper_model::ModelProvider;

use super::{ConversationSession, DEFAULT_WINDOW_SIZE};
use crate::advisor::Advisor;
use crate::history::HistoryWindow;
use crate::model_client::{ModelClient, TranscriptFn};
use crate::preferences::PreferenceSet;

/// [`ConversationSession`] builder.
///
/// The builder can be cloned to create any number of independent
/// sessions backed by the same provider.
#[derive(Clone)]
pub struct SessionBuilder {
    model_client: ModelClient,
    preferences: PreferenceSet,
    window_size: usize,
    on_transcript: Option<TranscriptFn>,
}

impl SessionBuilder {
    /// Creates a new builder with the specified completion provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            preferences: PreferenceSet::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            on_transcript: None,
        }
    }

    /// Sets the initial preferences.
    #[inline]
    pub fn with_preferences(mut self, preferences: PreferenceSet) -> Self {
        self.preferences = preferences;
        self
    }

    /// Sets how many exchanges are kept as context.
    #[inline]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Fails a turn with a timeout error if one provider attempt takes
    /// longer than `timeout`.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.model_client.set_timeout(Some(timeout));
        self
    }

    /// Retries rate limits, network failures and timeouts with
    /// exponential backoff. Without this, a failure ends the turn.
    #[inline]
    pub fn with_retry(mut self, backoff: ExponentialBackoff) -> Self {
        self.model_client.set_retry(Some(backoff));
        self
    }

    /// Attaches a callback to be invoked with every reply delta as it
    /// streams in.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Builds a session with an empty history.
    pub fn build(self) -> ConversationSession {
        ConversationSession {
            preferences: self.preferences,
            history: HistoryWindow::new(self.window_size),
            model_client: self.model_client,
            on_transcript: self.on_transcript,
        }
    }

    /// Builds a session and spawns an [`Advisor`] to own it.
    ///
    /// Must be called within a tokio runtime.
    #[inline]
    pub fn spawn(self) -> Advisor {
        Advisor::spawn_session(self.build())
    }
}
