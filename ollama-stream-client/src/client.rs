//! Ollama / Open WebUI HTTP client.

use futures::TryStreamExt;
use ollama_stream::{StreamHandlers, StreamSummary, process_stream};
use reqwest::StatusCode;
use tokio_util::io::StreamReader;

use crate::config::Dsn;
use crate::error::{ClientError, map_reqwest_error};
use crate::types::{GenerateRequest, ProcessStatus};

/// Client for the generate and ps endpoints.
///
/// # Example
///
/// ```no_run
/// use ollama_stream::StreamHandlers;
/// use ollama_stream_client::{Dsn, GenerateRequest, OllamaClient};
///
/// # async fn run() -> Result<(), ollama_stream_client::ClientError> {
/// let client = OllamaClient::new(Dsn::new("http://localhost:11434/api/generate", ""));
///
/// let mut handlers = StreamHandlers::new().on_event(|event| {
///     print!("{}", event.fragment().unwrap_or_default());
///     Ok(())
/// });
/// client
///     .query(GenerateRequest::new("llama3.2:3b", "Write a haiku"), &mut handlers)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// Endpoint and credentials.
    pub(crate) dsn: Dsn,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl OllamaClient {
    /// Client for `dsn` with a default HTTP client (no overall timeout, so
    /// long generations are not cut off).
    pub fn new(dsn: Dsn) -> Self {
        Self {
            dsn,
            client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS roots).
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The connection settings.
    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.dsn.has_token() {
            builder.bearer_auth(&self.dsn.token)
        } else {
            builder
        }
    }

    /// Send `request` and stream the response through `handlers`.
    ///
    /// The response body is processed as it arrives; see
    /// [`ollama_stream::StreamCoordinator`] for the dispatch rules. Returns
    /// the first failure from the transport, the decoder, or a handler.
    pub async fn query(
        &self,
        request: GenerateRequest,
        handlers: &mut StreamHandlers<'_>,
    ) -> Result<StreamSummary, ClientError> {
        let request = request.normalized();

        tracing::debug!(url = %self.dsn.url, model = %request.model, "sending generate request");

        let builder = self
            .client
            .post(&self.dsn.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request);
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes_stream().map_err(std::io::Error::other);
        let reader = StreamReader::new(Box::pin(body));
        let summary = process_stream(reader, handlers).await?;

        tracing::debug!(
            events = summary.events,
            code_blocks = summary.code_blocks,
            eval_count = ?summary.eval_count,
            "generate stream complete"
        );
        Ok(summary)
    }

    /// List the models currently loaded in memory.
    ///
    /// The URL is the DSN URL with its last path segment replaced by `ps`.
    pub async fn ps(&self) -> Result<ProcessStatus, ClientError> {
        let url = self.dsn.sibling_endpoint("ps")?;

        tracing::debug!(url = %url, "sending ps request");

        let builder = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        if status != StatusCode::OK {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(format!("failed to decode ps response: {e}")))
    }
}
