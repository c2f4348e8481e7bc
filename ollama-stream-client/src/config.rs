//! Connection settings.

use reqwest::Url;

use crate::error::ClientError;

/// Environment variable holding the generate endpoint URL.
pub const URL_ENV: &str = "OPEN_WEB_API_GENERATE_URL";

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "OPEN_WEB_API_TOKEN";

/// Default generate endpoint of a local Ollama server.
pub const DEFAULT_GENERATE_URL: &str = "http://localhost:11434/api/generate";

/// Where to send requests and how to authenticate.
///
/// `url` is the full generate endpoint (for Open WebUI this is usually
/// `https://host/ollama/api/generate`). Other endpoints are derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    /// Generate endpoint URL.
    pub url: String,
    /// Bearer token. Empty means no `Authorization` header.
    pub token: String,
}

impl Dsn {
    /// Settings for `url` with `token`.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }

    /// Read settings from `OPEN_WEB_API_GENERATE_URL` (required) and
    /// `OPEN_WEB_API_TOKEN` (optional).
    pub fn from_env() -> Result<Self, ClientError> {
        let url = std::env::var(URL_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ClientError::MissingEnv(URL_ENV))?;
        let token = std::env::var(TOKEN_ENV).unwrap_or_default();
        Ok(Self { url, token })
    }

    /// Whether requests carry a bearer token.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Endpoint obtained by replacing the last path segment of `url`.
    ///
    /// `http://host/api/generate` with `"ps"` gives `http://host/api/ps`.
    pub fn sibling_endpoint(&self, segment: &str) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.url).map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.url)))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(format!("{}: cannot be a base", self.url)))?
            .pop_if_empty()
            .pop()
            .push(segment);
        Ok(url)
    }
}

impl Default for Dsn {
    fn default() -> Self {
        Self::new(DEFAULT_GENERATE_URL, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_replaces_last_segment() {
        let dsn = Dsn::new("http://localhost:11434/api/generate", "");
        let url = dsn.sibling_endpoint("ps").expect("valid url");
        assert_eq!(url.as_str(), "http://localhost:11434/api/ps");
    }

    #[test]
    fn sibling_ignores_trailing_slash() {
        let dsn = Dsn::new("https://webui.example/ollama/api/generate/", "t");
        let url = dsn.sibling_endpoint("ps").expect("valid url");
        assert_eq!(url.as_str(), "https://webui.example/ollama/api/ps");
    }

    #[test]
    fn sibling_of_root_url() {
        let dsn = Dsn::new("http://localhost:11434", "");
        let url = dsn.sibling_endpoint("ps").expect("valid url");
        assert_eq!(url.as_str(), "http://localhost:11434/ps");
    }

    #[test]
    fn invalid_url_is_reported() {
        let dsn = Dsn::new("not a url", "");
        assert!(matches!(dsn.sibling_endpoint("ps"), Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn token_presence() {
        assert!(!Dsn::default().has_token());
        assert!(Dsn::new(DEFAULT_GENERATE_URL, "secret").has_token());
    }

    #[test]
    fn default_points_at_local_server() {
        assert_eq!(Dsn::default().url, DEFAULT_GENERATE_URL);
    }
}
