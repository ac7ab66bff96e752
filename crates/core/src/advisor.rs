mod state;

use std::collections::VecDeque;

use tokio::task::AbortHandle;
use tripwhisper_actor::Actor;

use crate::error::Error;
use crate::history::Message;
use crate::preferences::PreferenceSet;
use crate::session::ConversationSession;
use state::{AdvisorStage, Enqueue, Operation};

/// A conversation session running in its own actor.
///
/// Operations dispatched to the advisor are handled in the order they
/// were issued. While a turn is waiting for the provider, everything
/// issued after it, including further turns, is queued and handled once
/// the reply arrives. Cloned advisors refer to the same session.
#[derive(Clone)]
pub struct Advisor {
    handle: Actor<AdvisorState>,
}

struct AdvisorState {
    // Taken out while a turn is in flight.
    session: Option<ConversationSession>,
    current_stage: AdvisorStage,
    pending_ops: VecDeque<Operation>,
    turn_task: Option<AbortHandle>,
}

impl Drop for AdvisorState {
    fn drop(&mut self) {
        if let Some(task) = self.turn_task.take() {
            task.abort();
        }
    }
}

impl Advisor {
    pub(crate) fn spawn_session(session: ConversationSession) -> Self {
        let state = AdvisorState {
            session: Some(session),
            current_stage: AdvisorStage::Idle,
            pending_ops: VecDeque::new(),
            turn_task: None,
        };
        Self {
            handle: Actor::spawn(state, Some("advisor")),
        }
    }

    /// Sends a user message and waits for the advisor's reply.
    ///
    /// Returns `Ok(None)` if the input is blank.
    pub async fn submit_turn<S: Into<String>>(
        &self,
        user_text: S,
    ) -> Result<Option<String>, Error> {
        let user_text = user_text.into();
        let result = self
            .handle
            .call(|reply| Enqueue(Operation::Turn { user_text, reply }))
            .await?;
        Ok(result?)
    }

    /// Replaces the preferences and resizes the history window.
    pub async fn configure(
        &self,
        preferences: PreferenceSet,
        window_size: usize,
    ) -> Result<(), Error> {
        self.handle
            .call(|reply| {
                Enqueue(Operation::Configure {
                    preferences,
                    window_size,
                    reply,
                })
            })
            .await?;
        Ok(())
    }

    /// Returns the current preferences and window size.
    pub async fn preferences(&self) -> Result<(PreferenceSet, usize), Error> {
        let prefs = self
            .handle
            .call(|reply| Enqueue(Operation::Preferences { reply }))
            .await?;
        Ok(prefs)
    }

    /// Returns a copy of the history window, oldest first.
    pub async fn history(&self) -> Result<Vec<Message>, Error> {
        let history = self
            .handle
            .call(|reply| Enqueue(Operation::History { reply }))
            .await?;
        Ok(history)
    }

    /// Forgets the conversation but keeps the preferences.
    pub async fn clear(&self) -> Result<(), Error> {
        self.handle
            .call(|reply| Enqueue(Operation::Clear { reply }))
            .await?;
        Ok(())
    }

    /// Ends the session. A turn in flight is abandoned, and its caller
    /// gets [`Error::SessionClosed`].
    #[inline]
    pub fn close(&self) {
        self.handle.try_kill();
    }

    /// Returns `true` if the session has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.handle.is_dead()
    }
}
