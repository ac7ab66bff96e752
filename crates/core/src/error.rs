use std::error::Error as StdError;
use std::fmt::{self, Display};

use tripwhisper_actor::ActorDeadError;
pub use tripwhisper_model::ErrorKind;
use tripwhisper_model::ModelProviderError;

/// A failure reported by, or on the way to, the completion provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProviderError {
    kind: ErrorKind,
    message: String,
}

impl ProviderError {
    /// Creates a provider error.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the category of the failure.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message reported by the provider.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn from_provider<E: ModelProviderError>(err: &E) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl StdError for ProviderError {}

/// The error type for operations on an [`Advisor`](crate::Advisor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The completion provider failed; the history is unchanged.
    Provider(ProviderError),
    /// The session has been closed.
    SessionClosed,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Provider(err) => err.fmt(f),
            Error::SessionClosed => f.write_str("the session has been closed"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Provider(err) => Some(err),
            Error::SessionClosed => None,
        }
    }
}

impl From<ProviderError> for Error {
    #[inline]
    fn from(err: ProviderError) -> Self {
        Error::Provider(err)
    }
}

impl From<ActorDeadError> for Error {
    #[inline]
    fn from(_: ActorDeadError) -> Self {
        Error::SessionClosed
    }
}
