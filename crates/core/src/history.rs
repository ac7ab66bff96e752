//! The bounded window of past exchanges.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tripwhisper_model::ModelMessage;

/// The author of a [`Message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The traveller.
    User,
    /// The advisor.
    Assistant,
}

/// One message of the dialogue.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// The text of the message.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub(crate) fn to_model_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.content.clone()),
            Role::Assistant => ModelMessage::Assistant(self.content.clone()),
        }
    }
}

/// The most recent `k` exchanges of a conversation, oldest first.
///
/// The window never holds more than `2k` messages. When it overflows,
/// the oldest messages are evicted first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryWindow {
    messages: VecDeque<Message>,
    window_size: usize,
}

impl HistoryWindow {
    /// Creates an empty window that keeps `window_size` exchanges.
    ///
    /// A window size of zero is treated as one.
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            messages: VecDeque::with_capacity(window_size * 2),
            window_size,
        }
    }

    /// Returns the number of exchanges this window keeps.
    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Returns the maximum number of messages this window holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.window_size * 2
    }

    /// Returns the number of messages in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the window holds no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns an iterator over the messages, oldest first.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Message> {
        self.messages.iter()
    }

    /// Returns a copy of the messages, oldest first.
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Appends a completed exchange. Returns the number of evicted
    /// messages.
    pub fn push_exchange(&mut self, user: Message, assistant: Message) -> usize {
        self.messages.push_back(user);
        self.messages.push_back(assistant);
        self.evict()
    }

    /// Changes how many exchanges the window keeps, evicting the oldest
    /// messages if it shrinks. Returns the number of evicted messages.
    pub fn resize(&mut self, window_size: usize) -> usize {
        self.window_size = window_size.max(1);
        self.evict()
    }

    /// Removes all messages, keeping the window size.
    #[inline]
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn evict(&mut self) -> usize {
        let overflow = self.messages.len().saturating_sub(self.capacity());
        self.messages.drain(..overflow);
        overflow
    }
}

impl<'a> IntoIterator for &'a HistoryWindow {
    type Item = &'a Message;
    type IntoIter = std::collections::vec_deque::Iter<'a, Message>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(window: &HistoryWindow) -> Vec<&str> {
        window.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        for k in 1..=10 {
            let mut window = HistoryWindow::new(k);
            for n in 0..30 {
                window.push_exchange(
                    Message::user(format!("q{n}")),
                    Message::assistant(format!("a{n}")),
                );
                assert!(window.len() <= 2 * k);
                assert_eq!(window.len(), (2 * (n + 1)).min(2 * k));
            }
        }
    }

    #[test]
    fn test_fifo_eviction() {
        let mut window = HistoryWindow::new(2);
        let mut push = |n: usize| {
            window.push_exchange(
                Message::user(format!("q{n}")),
                Message::assistant(format!("a{n}")),
            )
        };
        assert_eq!(push(0), 0);
        assert_eq!(push(1), 0);
        assert_eq!(push(2), 2);
        assert_eq!(contents(&window), ["q1", "a1", "q2", "a2"]);
        window.push_exchange(Message::user("q3"), Message::assistant("a3"));
        assert_eq!(contents(&window), ["q2", "a2", "q3", "a3"]);
    }

    #[test]
    fn test_shrink_evicts_oldest() {
        let mut window = HistoryWindow::new(5);
        for n in 0..5 {
            window.push_exchange(
                Message::user(format!("q{n}")),
                Message::assistant(format!("a{n}")),
            );
        }
        assert_eq!(window.len(), 10);

        assert_eq!(window.resize(2), 6);
        assert_eq!(contents(&window), ["q3", "a3", "q4", "a4"]);

        // Growing again keeps what is left.
        assert_eq!(window.resize(10), 0);
        assert_eq!(window.len(), 4);
        assert_eq!(window.capacity(), 20);
    }

    #[test]
    fn test_zero_window_size() {
        let mut window = HistoryWindow::new(0);
        assert_eq!(window.window_size(), 1);
        window.push_exchange(Message::user("q"), Message::assistant("a"));
        window.push_exchange(Message::user("q2"), Message::assistant("a2"));
        assert_eq!(contents(&window), ["q2", "a2"]);
    }

    #[test]
    fn test_model_messages() {
        let msg = Message::assistant("Try Bali.");
        assert_eq!(
            msg.to_model_message(),
            ModelMessage::Assistant("Try Bali.".to_owned())
        );
        assert_eq!(
            Message::user("Hi").to_model_message(),
            ModelMessage::User("Hi".to_owned())
        );
    }
}
