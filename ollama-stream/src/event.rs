//! Stream events decoded from NDJSON lines.
//!
//! Ollama's `/api/generate` endpoint emits one JSON object per line:
//! ```text
//! {"model":"llama3.2","created_at":"2024-08-04T19:22:45.499127Z","response":"Hello","done":false}
//! {"model":"llama3.2","created_at":"2024-08-04T19:22:45.562451Z","response":"","done":true,"done_reason":"stop","prompt_eval_count":26,"eval_count":12}
//! ```
//!
//! Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-completion>

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// One decoded line of a generate stream.
///
/// Every field is optional; fields the server adds that are not listed
/// here are ignored. Exactly one event per well-formed stream carries
/// `done: true`, and it is the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Model that produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// When the server produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Text fragment. Empty or absent on the terminal event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    /// Why generation stopped (e.g. "stop", "length").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    /// Conversation context tokens returned with the terminal event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    /// Total generation time in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    /// Model load time in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    /// Number of prompt tokens evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Prompt evaluation time in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    /// Number of tokens generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    /// Generation time in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl StreamEvent {
    /// The text fragment, if present and non-empty.
    pub fn fragment(&self) -> Option<&str> {
        self.response.as_deref().filter(|s| !s.is_empty())
    }

    /// Whether this is the terminal event of the stream.
    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}

/// Decode one token into a [`StreamEvent`].
///
/// `line` is the 1-based position of the token in the stream and is only
/// used for the error message. There is no lenient mode: a malformed
/// token is a [`StreamError::Decode`].
pub fn decode_event(token: &[u8], line: usize) -> Result<StreamEvent, StreamError> {
    serde_json::from_slice(token).map_err(|source| StreamError::Decode { line, source })
}
