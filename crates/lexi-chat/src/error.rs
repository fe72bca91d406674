//! Error types for the conversational core.
//!
//! None of these terminate a session: resolution failures become error
//! turns in the transcript and link failures become a visible state on
//! the citation view.

use std::time::Duration;

/// Failure of the answer backend to produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("answer backend failed: {0}")]
    Failed(String),
    #[error("no answer within {0:?}")]
    TimedOut(Duration),
    #[error("request was cancelled")]
    Cancelled,
}

/// A citation link that cannot be opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("citation has no link")]
    Empty,
    #[error("malformed link {link}: {reason}")]
    Malformed { link: String, reason: String },
    #[error("unsupported link scheme: {0}")]
    UnsupportedScheme(String),
    #[error("could not open link: {0}")]
    OpenFailed(String),
}
