use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The credential was rejected by the provider.
    Authentication,
    /// The model provider is rate limited or the quota is exhausted.
    RateLimitExceeded,
    /// The provider could not be reached, or the connection dropped.
    Network,
    /// The provider answered with something we cannot understand.
    MalformedResponse,
    /// The content is moderated.
    Moderated,
    /// The request did not finish in time.
    Timeout,
    /// Any other errors.
    Other,
}

impl ErrorKind {
    /// Returns `true` if retrying the same request may succeed.
    #[inline]
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimitExceeded
                | ErrorKind::Network
                | ErrorKind::Timeout
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Authentication => "authentication failed",
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::Network => "network error",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::Moderated => "content moderated",
            ErrorKind::Timeout => "timed out",
            ErrorKind::Other => "provider error",
        };
        f.write_str(s)
    }
}
