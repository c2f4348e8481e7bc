//! Ollama `/api/generate` request types and `/api/ps` response types.
//!
//! Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-completion>

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Model used for image requests that do not name one.
pub const DEFAULT_VISION_MODEL: &str = "x/llama3.2-vision";

/// Output format requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestFormat {
    /// Constrain the response to valid JSON.
    Json,
    /// Free text (server default).
    Text,
}

/// Raw image bytes, sent as a base64 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestImage(pub Vec<u8>);

impl Serialize for RequestImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl From<Vec<u8>> for RequestImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Runtime options for the model.
///
/// Every field is optional and omitted from the request when unset.
/// See <https://github.com/ollama/ollama/blob/main/docs/modelfile.md#valid-parameters-and-values>.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestOptions {
    /// Context window size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    /// Prompt processing batch size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_batch: Option<u32>,
    /// Tokens to keep from the initial prompt when the context rolls over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_keep: Option<i32>,
    /// Random seed for reproducible output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    /// Top-k sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Top-p (nucleus) sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Minimum token probability relative to the most likely token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f64>,
    /// Tail-free sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tfs_z: Option<f64>,
    /// Locally typical sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_p: Option<f64>,
    /// How far back to look when penalizing repetition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_last_n: Option<i32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Repetition penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
    /// Penalty for tokens already present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Penalty scaled by token frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Mirostat sampling mode (0 off, 1 or 2).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat: Option<u8>,
    /// Mirostat target entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat_tau: Option<f64>,
    /// Mirostat learning rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat_eta: Option<f64>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// Enable NUMA support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numa: Option<bool>,
    /// Number of layers to offload to the GPU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<i32>,
    /// GPU used for small tensors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_gpu: Option<u32>,
    /// CPU threads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_thread: Option<u32>,
    /// Padding tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad_tokens: Option<u32>,
    /// Penalize newline tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalize_newline: Option<bool>,
    /// Low VRAM mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_vram: Option<bool>,
    /// Half-precision key/value cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f16_kv: Option<bool>,
    /// Load only the vocabulary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocab_only: Option<bool>,
    /// Lock the model in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_mlock: Option<bool>,
    /// Memory-map the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_mmap: Option<bool>,
}

/// Body of a `/api/generate` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateRequest {
    /// Model name (e.g. "llama3.2:3b").
    pub model: String,
    /// Prompt text.
    pub prompt: String,
    /// Overrides the model's system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Response format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<RequestFormat>,
    /// Model runtime options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RequestOptions>,
    /// Text placed after the model response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Images for multimodal models.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<RequestImage>,
    /// Context returned by a previous response. Kept client-side only.
    #[serde(skip)]
    pub context: Vec<i64>,
    /// How long the model stays loaded after the request (e.g. "5m").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    /// Skip prompt templating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
    /// Stream the response line by line. Server default is `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl GenerateRequest {
    /// Request for `model` with `prompt`; everything else unset.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set the runtime options.
    #[must_use]
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the response format.
    #[must_use]
    pub fn format(mut self, format: RequestFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Attach an image.
    #[must_use]
    pub fn image(mut self, image: impl Into<RequestImage>) -> Self {
        self.images.push(image.into());
        self
    }

    /// Apply the adjustments the server needs before sending.
    ///
    /// Image requests are sent unstreamed, and default to
    /// [`DEFAULT_VISION_MODEL`] when no model is named.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if !self.images.is_empty() {
            self.stream = Some(false);
            if self.model.is_empty() {
                self.model = DEFAULT_VISION_MODEL.into();
            }
        }
        self
    }

    /// Serialize the normalized request.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.clone().normalized())
    }
}

/// Format metadata of a loaded model.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcessModelDetails {
    /// Model this one was derived from.
    #[serde(default)]
    pub parent_model: String,
    /// File format (e.g. "gguf").
    #[serde(default)]
    pub format: String,
    /// Model family.
    #[serde(default)]
    pub family: String,
    /// All families the model belongs to.
    #[serde(default)]
    pub families: Option<Vec<String>>,
    /// Parameter count (e.g. "3.2B").
    #[serde(default)]
    pub parameter_size: String,
    /// Quantization level (e.g. "Q4_K_M").
    #[serde(default, rename = "quantization_level")]
    pub quant_level: String,
}

/// A model currently loaded in memory.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcessModel {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Model identifier.
    #[serde(default)]
    pub model: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: i64,
    /// Content digest.
    #[serde(default)]
    pub digest: String,
    /// Format metadata.
    #[serde(default)]
    pub details: ProcessModelDetails,
    /// When the model will be unloaded.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Bytes resident in VRAM.
    #[serde(default)]
    pub size_vram: i64,
    /// Context length the model was loaded with.
    #[serde(default)]
    pub context_length: u32,
}

/// Response of `/api/ps`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcessStatus {
    /// Loaded models.
    #[serde(default)]
    pub models: Vec<ProcessModel>,
}
