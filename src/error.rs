//! Error taxonomy for listing screens.
//!
//! Every variant leaves the controller retryable: validation failures block
//! the call before it is issued, transport and server failures keep the last
//! good page on screen, and stale responses are dropped without a notice.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// Client-side check failed before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// The request never produced an HTTP response (connect, timeout, DNS).
    #[error("{0}")]
    Network(String),

    /// The collaborator answered but reported failure (`success: false` or
    /// a non-2xx status). Carries a human-readable message.
    #[error("{0}")]
    Server(String),

    /// The response arrived but could not be read as the expected shape.
    #[error("Invalid response from admin dashboard: {0}")]
    Decode(String),

    /// A response for request `seq` arrived after request `latest` was issued.
    #[error("Discarded stale response #{seq} (latest is #{latest})")]
    StaleResponse { seq: u64, latest: u64 },
}

impl ListError {
    /// Whether the error should surface as a notice. Stale responses are
    /// silently discarded.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, ListError::StaleResponse { .. })
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ListError::Network(_) | ListError::Server(_))
    }
}

impl From<serde_json::Error> for ListError {
    fn from(err: serde_json::Error) -> Self {
        ListError::Decode(err.to_string())
    }
}
