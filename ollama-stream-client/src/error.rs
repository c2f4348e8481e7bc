//! Client errors and mapping from reqwest failures.

use ollama_stream::StreamError;

/// Errors from [`OllamaClient`](crate::OllamaClient) calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// The request timed out.
    #[error("request timed out")]
    Timeout,
    /// The server answered with a non-200 status.
    #[error("request failed, status code: {status}, body: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// A single-shot response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The configured URL cannot be used.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A required environment variable is not set.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    /// The streamed response failed.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl ClientError {
    /// Whether the request may succeed if sent again.
    ///
    /// Nothing in this crate retries; callers decide.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status { status, .. } => (500..=599).contains(status),
            Self::Stream(StreamError::Transport(_)) => true,
            _ => false,
        }
    }
}

/// Map a [`reqwest::Error`] to a [`ClientError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Network(err)
    }
}
