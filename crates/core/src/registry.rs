//! Per-identity sessions for hosts serving many users at once.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::advisor::Advisor;
use crate::session::SessionBuilder;

/// Identifies one user's session, e.g. a browser tab or a chat id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Returns the identifier as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    #[inline]
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of isolated sessions keyed by [`SessionId`].
///
/// Every session gets its own history and preferences, created from the
/// registry's template builder when the session is opened.
pub struct SessionRegistry {
    template: SessionBuilder,
    sessions: Mutex<HashMap<SessionId, Advisor>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new(template: SessionBuilder) -> Self {
        Self {
            template,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `id`, starting a new one if there is none
    /// or the previous one has been closed.
    ///
    /// Must be called within a tokio runtime.
    pub fn open<I: Into<SessionId>>(&self, id: I) -> Advisor {
        let id = id.into();
        let mut sessions = self.sessions();
        if let Some(advisor) = sessions.get(&id) {
            if !advisor.is_closed() {
                return advisor.clone();
            }
        }
        debug!("starting session {id}");
        let advisor = self.template.clone().spawn();
        sessions.insert(id, advisor.clone());
        advisor
    }

    /// Returns the live session for `id`, if any.
    pub fn get<I: Into<SessionId>>(&self, id: I) -> Option<Advisor> {
        self.sessions()
            .get(&id.into())
            .filter(|advisor| !advisor.is_closed())
            .cloned()
    }

    /// Ends the session for `id`. Returns `false` if there was none.
    pub fn close<I: Into<SessionId>>(&self, id: I) -> bool {
        let id = id.into();
        let Some(advisor) = self.sessions().remove(&id) else {
            return false;
        };
        debug!("closing session {id}");
        advisor.close();
        true
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        let mut sessions = self.sessions();
        sessions.retain(|_, advisor| !advisor.is_closed());
        sessions.len()
    }

    /// Returns `true` if there are no live sessions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Advisor>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        for advisor in self.sessions().values() {
            advisor.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use tripwhisper_test_model::TestModelProvider;

    use super::*;
    use crate::preferences::{PreferenceSet, Season};

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let mut provider = TestModelProvider::default();
        provider.add_text_response("Try Bali.");
        provider.add_text_response("Try Lapland.");
        let registry = SessionRegistry::new(
            SessionBuilder::with_model_provider(provider.clone()),
        );

        let alice = registry.open("tab-1");
        let bob = registry.open("tab-2");
        assert_eq!(registry.len(), 2);

        let winter = PreferenceSet {
            season: Season::Winter,
            ..Default::default()
        };
        bob.configure(winter, 2).await.unwrap();

        alice.submit_turn("Somewhere warm?").await.unwrap();
        bob.submit_turn("Somewhere snowy?").await.unwrap();

        let alice_history = alice.history().await.unwrap();
        let bob_history = bob.history().await.unwrap();
        assert_eq!(alice_history.len(), 2);
        assert_eq!(alice_history[0].content, "Somewhere warm?");
        assert_eq!(bob_history.len(), 2);
        assert_eq!(bob_history[0].content, "Somewhere snowy?");

        // Each request saw only its own session's history.
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 2);

        let (_, alice_window) = alice.preferences().await.unwrap();
        assert_eq!(alice_window, crate::DEFAULT_WINDOW_SIZE);
    }

    #[tokio::test]
    async fn test_open_returns_existing_session() {
        let mut provider = TestModelProvider::default();
        provider.add_text_response("Try Bali.");
        let registry =
            SessionRegistry::new(SessionBuilder::with_model_provider(provider));

        registry.open("tab-1").submit_turn("Hi").await.unwrap();
        let history = registry.open("tab-1").history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(registry.get("tab-1").is_some());
        assert!(registry.get("tab-9").is_none());
    }

    #[tokio::test]
    async fn test_close_session() {
        let registry = SessionRegistry::new(
            SessionBuilder::with_model_provider(TestModelProvider::default()),
        );
        let advisor = registry.open("tab-1");
        assert!(registry.close("tab-1"));
        assert!(!registry.close("tab-1"));
        assert!(advisor.is_closed());
        assert!(registry.is_empty());
        assert_eq!(
            advisor.history().await.unwrap_err(),
            crate::Error::SessionClosed
        );

        // Opening again starts from scratch.
        let advisor = registry.open("tab-1");
        assert!(advisor.history().await.unwrap().is_empty());
    }
}
