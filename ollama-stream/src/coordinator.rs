//! Drives one NDJSON stream end to end.
//!
//! scan → decode → event handler → fence extractor → block handler, one
//! token at a time. The first error from any stage ends the stream.

use tokio::io::AsyncRead;

use crate::error::{HandlerResult, StreamError};
use crate::event::{StreamEvent, decode_event};
use crate::fence::{CodeBlock, FenceExtractor, FenceMatcher, RegexFenceMatcher};
use crate::scanner::DelimiterScanner;

/// Boxed per-event handler.
pub type EventHandler<'a> = Box<dyn FnMut(StreamEvent) -> HandlerResult + Send + 'a>;

/// Boxed per-block-batch handler.
pub type BlockHandler<'a> = Box<dyn FnMut(Vec<CodeBlock>) -> HandlerResult + Send + 'a>;

/// Caller-supplied observers for a stream.
///
/// Both handlers are optional. Returning `Err` from either one stops the
/// stream; the error comes back verbatim from [`StreamCoordinator::run`].
///
/// ```
/// use ollama_stream::StreamHandlers;
///
/// let mut text = String::new();
/// let handlers = StreamHandlers::new().on_event(|event| {
///     if let Some(fragment) = event.fragment() {
///         text.push_str(fragment);
///     }
///     Ok(())
/// });
/// # drop(handlers);
/// ```
#[derive(Default)]
pub struct StreamHandlers<'a> {
    on_event: Option<EventHandler<'a>>,
    on_code_blocks: Option<BlockHandler<'a>>,
}

impl<'a> StreamHandlers<'a> {
    /// No handlers registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the per-event handler. Events arrive in stream order and
    /// ownership passes to the handler.
    #[must_use]
    pub fn on_event<F>(mut self, handler: F) -> Self
    where
        F: FnMut(StreamEvent) -> HandlerResult + Send + 'a,
    {
        self.on_event = Some(Box::new(handler));
        self
    }

    /// Register the per-block-batch handler. Registering it enables fence
    /// extraction for the stream.
    #[must_use]
    pub fn on_code_blocks<F>(mut self, handler: F) -> Self
    where
        F: FnMut(Vec<CodeBlock>) -> HandlerResult + Send + 'a,
    {
        self.on_code_blocks = Some(Box::new(handler));
        self
    }

    /// Whether an event handler is registered.
    pub fn has_event_handler(&self) -> bool {
        self.on_event.is_some()
    }

    /// Whether a block handler is registered.
    pub fn has_block_handler(&self) -> bool {
        self.on_code_blocks.is_some()
    }
}

impl std::fmt::Debug for StreamHandlers<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandlers")
            .field("on_event", &self.on_event.is_some())
            .field("on_code_blocks", &self.on_code_blocks.is_some())
            .finish()
    }
}

/// Accounting for a stream that finished without error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Events decoded and delivered.
    pub events: usize,
    /// Code blocks extracted and delivered.
    pub code_blocks: usize,
    /// Whether the completion event arrived.
    pub completed: bool,
    /// Last model name seen.
    pub model: Option<String>,
    /// Why generation stopped, from the completion event.
    pub done_reason: Option<String>,
    /// Prompt tokens evaluated, from the completion event.
    pub prompt_eval_count: Option<u64>,
    /// Tokens generated, from the completion event.
    pub eval_count: Option<u64>,
}

impl StreamSummary {
    fn record(&mut self, event: &StreamEvent) {
        self.events += 1;
        if event.model.is_some() {
            self.model.clone_from(&event.model);
        }
        if event.is_done() {
            self.completed = true;
            self.done_reason.clone_from(&event.done_reason);
        }
        if event.prompt_eval_count.is_some() {
            self.prompt_eval_count = event.prompt_eval_count;
        }
        if event.eval_count.is_some() {
            self.eval_count = event.eval_count;
        }
    }
}

/// Per-stream state: the fence extractor and running accounting.
///
/// One coordinator serves one stream. Concurrent streams each get their
/// own.
#[derive(Debug)]
pub struct StreamCoordinator<M = RegexFenceMatcher> {
    extractor: FenceExtractor<M>,
    summary: StreamSummary,
    lines: usize,
}

impl StreamCoordinator {
    /// Coordinator using the default fence matcher.
    pub fn new() -> Self {
        Self::with_matcher(RegexFenceMatcher::new())
    }
}

impl Default for StreamCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: FenceMatcher> StreamCoordinator<M> {
    /// Coordinator using a custom fence matcher.
    pub fn with_matcher(matcher: M) -> Self {
        Self {
            extractor: FenceExtractor::with_matcher(matcher),
            summary: StreamSummary::default(),
            lines: 0,
        }
    }

    /// Consume `reader` as NDJSON until it ends or something fails.
    ///
    /// An unterminated fence left in the buffer at end of stream is
    /// dropped silently.
    pub async fn run<R>(
        mut self,
        reader: R,
        handlers: &mut StreamHandlers<'_>,
    ) -> Result<StreamSummary, StreamError>
    where
        R: AsyncRead + Unpin,
    {
        let mut scanner = DelimiterScanner::ndjson(reader);

        while let Some(token) = scanner.next_token().await {
            let token = token?;
            self.handle_token(&token, handlers)?;
        }

        if !self.extractor.is_empty() {
            tracing::debug!(
                pending = self.extractor.pending().len(),
                "discarding unterminated text at end of stream"
            );
        }
        tracing::debug!(
            events = self.summary.events,
            code_blocks = self.summary.code_blocks,
            completed = self.summary.completed,
            "stream finished"
        );

        Ok(self.summary)
    }

    /// Decode one token and dispatch it.
    ///
    /// Every token must be a valid event; an empty line is a decode
    /// error like any other. Exposed for callers that tokenize the stream
    /// themselves.
    pub fn handle_token(
        &mut self,
        token: &[u8],
        handlers: &mut StreamHandlers<'_>,
    ) -> Result<(), StreamError> {
        self.lines += 1;
        let event = decode_event(token, self.lines)?;
        tracing::trace!(line = self.lines, done = event.is_done(), "decoded event");

        if self.summary.completed {
            tracing::warn!(line = self.lines, "event received after completion event");
        }
        self.summary.record(&event);

        let fragment = if handlers.has_block_handler() {
            event.response.clone()
        } else {
            None
        };

        if let Some(on_event) = handlers.on_event.as_mut() {
            on_event(event).map_err(StreamError::EventHandler)?;
        }

        if let (Some(on_blocks), Some(fragment)) = (handlers.on_code_blocks.as_mut(), fragment) {
            let blocks = self.extractor.push(&fragment);
            if !blocks.is_empty() {
                self.summary.code_blocks += blocks.len();
                on_blocks(blocks).map_err(StreamError::BlockHandler)?;
            }
        }

        Ok(())
    }

    /// Accounting so far.
    pub fn summary(&self) -> &StreamSummary {
        &self.summary
    }

    /// Text buffered while waiting for a closing fence.
    pub fn pending_text(&self) -> &str {
        self.extractor.pending()
    }
}

/// Run a fresh [`StreamCoordinator`] over `reader`.
pub async fn process_stream<R>(
    reader: R,
    handlers: &mut StreamHandlers<'_>,
) -> Result<StreamSummary, StreamError>
where
    R: AsyncRead + Unpin,
{
    StreamCoordinator::new().run(reader, handlers).await
}
