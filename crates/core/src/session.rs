//! The conversation session: bounded history plus prompt assembly.

mod builder;

use tripwhisper_model::{ModelMessage, ModelRequest};

pub use builder::SessionBuilder;

use crate::error::ProviderError;
use crate::history::{HistoryWindow, Message};
use crate::model_client::{ModelClient, TranscriptFn};
use crate::preferences::PreferenceSet;
use crate::prompt::render_system_instructions;

/// The smallest window size the host offers.
pub const MIN_WINDOW_SIZE: usize = 2;
/// The largest window size the host offers.
pub const MAX_WINDOW_SIZE: usize = 10;
/// The window size used when nothing else is configured.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// One conversation with the travel advisor.
///
/// The session owns the history window and the current preferences, and
/// talks to the completion provider for every turn. Turns take `&mut
/// self`, so a session can never have two turns in flight. Use
/// [`Advisor`](crate::Advisor) to share a session between tasks.
pub struct ConversationSession {
    preferences: PreferenceSet,
    history: HistoryWindow,
    model_client: ModelClient,
    on_transcript: Option<TranscriptFn>,
}

impl ConversationSession {
    /// Replaces the preferences and resizes the history window.
    ///
    /// Existing messages are kept, except that the oldest ones are
    /// dropped if the window shrinks.
    pub fn configure(&mut self, preferences: PreferenceSet, window_size: usize) {
        debug!(
            "configure: {:?}, window size {window_size}",
            preferences.travel_type
        );
        self.preferences = preferences;
        let evicted = self.history.resize(window_size);
        if evicted > 0 {
            debug!("evicted {evicted} messages after resizing");
        }
    }

    /// Sends `user_text` to the advisor and returns the reply.
    ///
    /// Blank input is ignored and yields `Ok(None)`. The exchange enters
    /// the history only once the reply is complete, so a failed turn
    /// leaves the history exactly as it was.
    pub async fn submit_turn(
        &mut self,
        user_text: &str,
    ) -> Result<Option<String>, ProviderError> {
        if user_text.trim().is_empty() {
            trace!("ignored blank input");
            return Ok(None);
        }

        let request = self.build_model_request(user_text);
        debug!(
            "sending {} messages to {}",
            request.messages.len(),
            request.model
        );
        let resp = self
            .model_client
            .send_request(request, self.on_transcript.clone())
            .await
            .inspect_err(|err| warn!("turn failed: {err}"))?;

        let evicted = self.history.push_exchange(
            Message::user(user_text),
            Message::assistant(resp.transcript.clone()),
        );
        if evicted > 0 {
            trace!("evicted {evicted} messages");
        }
        Ok(Some(resp.transcript))
    }

    /// Returns the current preferences.
    #[inline]
    pub fn preferences(&self) -> &PreferenceSet {
        &self.preferences
    }

    /// Returns the number of exchanges kept as context.
    #[inline]
    pub fn window_size(&self) -> usize {
        self.history.window_size()
    }

    /// Returns the history window.
    #[inline]
    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Renders the system instructions for the current preferences.
    #[inline]
    pub fn system_instructions(&self) -> String {
        render_system_instructions(&self.preferences)
    }

    /// Forgets the conversation but keeps the preferences.
    #[inline]
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Assembles system instructions, the history window and the new
    /// input, in this order.
    fn build_model_request(&self, user_text: &str) -> ModelRequest {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ModelMessage::System(self.system_instructions()));
        messages.extend(self.history.iter().map(Message::to_model_message));
        messages.push(ModelMessage::User(user_text.to_owned()));
        ModelRequest {
            model: self.preferences.model_id.clone(),
            messages,
        }
    }
}
