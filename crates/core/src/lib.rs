//! Core logic of the travel advisor: preferences, the system prompt,
//! the bounded history window and the conversation session around them.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod advisor;
mod error;
pub mod history;
mod model_client;
pub mod preferences;
pub mod prompt;
pub mod registry;
mod session;

pub use advisor::Advisor;
pub use backoff::ExponentialBackoff;
pub use error::{Error, ErrorKind, ProviderError};
pub use history::{HistoryWindow, Message, Role};
pub use preferences::{
    BudgetRange, ItineraryStyle, PreferenceSet, Season, TravelType,
};
pub use prompt::render_system_instructions;
pub use registry::{SessionId, SessionRegistry};
pub use session::{
    ConversationSession, DEFAULT_WINDOW_SIZE, MAX_WINDOW_SIZE,
    MIN_WINDOW_SIZE, SessionBuilder,
};
