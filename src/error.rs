//! Top-level error types for Threadbot.

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Slack(#[from] SlackError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config key: {0}")]
    MissingKey(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Slack Web API errors (thread fetch, message post).
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("failed to fetch thread replies in {channel}: {message}")]
    ThreadFetch { channel: String, message: String },

    #[error("failed to post message to {channel}: {message}")]
    PostMessage { channel: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Completion endpoint errors.
///
/// `Api` keeps the raw response body so the handler can log the provider's
/// structured error detail before falling back.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}
