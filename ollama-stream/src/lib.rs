#![deny(missing_docs)]
//! Incremental NDJSON stream processing for Ollama-style generate streams.
//!
//! Two layers compose over a live byte stream:
//!
//! - [`DelimiterScanner`] splits arbitrarily chunked bytes into
//!   newline-delimited tokens, each decoded into a [`StreamEvent`].
//! - [`FenceExtractor`] watches the accumulated text fragments for
//!   Markdown fenced code blocks and emits each [`CodeBlock`] as soon as
//!   its closing fence arrives.
//!
//! [`StreamCoordinator`] drives both and dispatches to caller-supplied
//! [`StreamHandlers`]. Any transport, decode, or handler failure stops the
//! stream and is returned as a [`StreamError`].
//!
//! # Usage
//!
//! ```
//! use ollama_stream::{StreamHandlers, process_stream};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ollama_stream::StreamError> {
//! let body: &[u8] = b"{\"response\":\"```sh\\nls\\n```\",\"done\":false}\n{\"done\":true}\n";
//!
//! let mut blocks = Vec::new();
//! let mut handlers = StreamHandlers::new().on_code_blocks(|batch| {
//!     blocks.extend(batch);
//!     Ok(())
//! });
//! let summary = process_stream(body, &mut handlers).await?;
//! drop(handlers);
//!
//! assert!(summary.completed);
//! assert_eq!(blocks[0].language, "sh");
//! assert_eq!(blocks[0].code, "ls\n");
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod event;
pub mod fence;
pub mod scanner;

pub use coordinator::{
    BlockHandler, EventHandler, StreamCoordinator, StreamHandlers, StreamSummary, process_stream,
};
pub use error::{HandlerError, HandlerResult, StreamError};
pub use event::{StreamEvent, decode_event};
pub use fence::{CodeBlock, FenceExtractor, FenceMatch, FenceMatcher, RegexFenceMatcher};
pub use scanner::{DelimiterScanner, NDJSON_SEPARATOR};
