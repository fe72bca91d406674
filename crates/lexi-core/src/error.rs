use thiserror::Error;

/// Top-level error type for the Lexi application.
///
/// Covers the ambient concerns shared by every crate: configuration,
/// file I/O and serialization. Conversation failures are modelled by the
/// chat crate's own error types and never escape the session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LexiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for LexiError {
    fn from(err: toml::de::Error) -> Self {
        LexiError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LexiError {
    fn from(err: toml::ser::Error) -> Self {
        LexiError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LexiError {
    fn from(err: serde_json::Error) -> Self {
        LexiError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Lexi operations.
pub type Result<T> = std::result::Result<T, LexiError>;
