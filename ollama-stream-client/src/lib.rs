#![deny(missing_docs)]
//! HTTP transport for [`ollama_stream`].
//!
//! Sends `/api/generate` requests to an Ollama server (directly or through
//! an Open WebUI proxy with a bearer token) and feeds the NDJSON response
//! body to the [`ollama_stream`] coordinator as it arrives.
//!
//! # Usage
//!
//! ```no_run
//! use ollama_stream::StreamHandlers;
//! use ollama_stream_client::{Dsn, GenerateRequest, OllamaClient, RequestOptions};
//!
//! # async fn run() -> Result<(), ollama_stream_client::ClientError> {
//! let client = OllamaClient::new(Dsn::from_env()?);
//! let request = GenerateRequest::new("llama3.2:3b", "Write a simple Go HTTP server")
//!     .options(RequestOptions {
//!         temperature: Some(0.0),
//!         ..Default::default()
//!     });
//!
//! let mut blocks = Vec::new();
//! let mut handlers = StreamHandlers::new().on_code_blocks(|batch| {
//!     blocks.extend(batch);
//!     Ok(())
//! });
//! let summary = client.query(request, &mut handlers).await?;
//! drop(handlers);
//! println!("{} events, {} code blocks", summary.events, blocks.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - Streaming generate with per-event and per-code-block handlers
//! - Every Ollama runtime option in [`RequestOptions`]
//! - Image attachments, sent base64-encoded
//! - Running-model status via [`OllamaClient::ps`]
//! - Status and transport failures mapped to [`ClientError`]

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::OllamaClient;
pub use config::{DEFAULT_GENERATE_URL, Dsn, TOKEN_ENV, URL_ENV};
pub use error::ClientError;
pub use types::{
    DEFAULT_VISION_MODEL, GenerateRequest, ProcessModel, ProcessModelDetails, ProcessStatus,
    RequestFormat, RequestImage, RequestOptions,
};

// Re-export the core for convenience
pub use ollama_stream::{CodeBlock, StreamError, StreamEvent, StreamHandlers, StreamSummary};
