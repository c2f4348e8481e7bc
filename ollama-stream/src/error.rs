//! Error taxonomy for a single NDJSON stream.

/// Error type returned by caller-supplied handlers.
///
/// Handlers box whatever error their own logic produces; the coordinator
/// hands it back untouched inside [`StreamError::EventHandler`] or
/// [`StreamError::BlockHandler`].
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by every handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors that terminate a stream.
///
/// Every variant is fatal for the stream that produced it. Nothing is
/// retried inside this crate.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Reading from the underlying byte stream failed.
    #[error("failed to read stream: {0}")]
    Transport(#[source] std::io::Error),
    /// A token was not a valid stream event.
    #[error("failed to decode stream event on line {line}: {source}")]
    Decode {
        /// 1-based index of the offending token.
        line: usize,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The per-event handler reported a failure.
    #[error("event handler failed: {0}")]
    EventHandler(#[source] HandlerError),
    /// The per-block-batch handler reported a failure.
    #[error("code block handler failed: {0}")]
    BlockHandler(#[source] HandlerError),
    /// A scanner was constructed with an empty separator.
    #[error("separator must not be empty")]
    EmptySeparator,
}

impl StreamError {
    /// Whether the error was raised by a caller-supplied handler rather
    /// than by the protocol layers.
    #[must_use]
    pub fn is_handler(&self) -> bool {
        matches!(self, Self::EventHandler(_) | Self::BlockHandler(_))
    }

    /// Name of the phase that failed.
    #[must_use]
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Decode { .. } => "decode",
            Self::EventHandler(_) => "event handler",
            Self::BlockHandler(_) => "block handler",
            Self::EmptySeparator => "config",
        }
    }

    /// Recover the error a handler returned, exactly as it was returned.
    pub fn into_handler_error(self) -> Option<HandlerError> {
        match self {
            Self::EventHandler(e) | Self::BlockHandler(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("user aborted")]
    struct Aborted;

    #[test]
    fn io_error_maps_to_transport() {
        let err: StreamError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, StreamError::Transport(_)));
        assert_eq!(err.phase(), "transport");
        assert!(!err.is_handler());
    }

    #[test]
    fn decode_error_reports_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StreamError::Decode { line: 3, source };
        assert!(err.to_string().contains("line 3"), "got: {err}");
        assert_eq!(err.phase(), "decode");
    }

    #[test]
    fn handler_error_round_trips_verbatim() {
        let err = StreamError::EventHandler(Box::new(Aborted));
        assert!(err.is_handler());
        assert_eq!(err.phase(), "event handler");

        let inner = err.into_handler_error().expect("handler error");
        assert!(inner.downcast_ref::<Aborted>().is_some());
    }

    #[test]
    fn block_handler_is_distinguished_from_event_handler() {
        let err = StreamError::BlockHandler("disk full".into());
        assert_eq!(err.phase(), "block handler");
        assert_eq!(err.to_string(), "code block handler failed: disk full");
    }

    #[test]
    fn non_handler_errors_have_no_handler_error() {
        assert!(StreamError::EmptySeparator.into_handler_error().is_none());
    }
}
