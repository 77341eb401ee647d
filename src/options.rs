//! Transport configuration and API family selection.

use std::collections::HashMap;
use std::time::Duration;

use crate::stream::WireFormat;

/// API key wrapper whose `Debug` output is redacted.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// The key as sent on the wire.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Family of HTTP API spoken by the server under test.
///
/// Fixes the endpoint paths and the framing of streamed chat responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ApiFamily {
    /// OpenAI-compatible servers (LM Studio, vLLM, llama.cpp, ...).
    #[cfg_attr(feature = "cli", value(name = "openai"))]
    OpenAi,
    Ollama,
}

impl ApiFamily {
    pub fn wire_format(self) -> WireFormat {
        match self {
            ApiFamily::OpenAi => WireFormat::Sse,
            ApiFamily::Ollama => WireFormat::LineJson,
        }
    }

    pub fn chat_path(self) -> &'static str {
        match self {
            ApiFamily::OpenAi => "/v1/chat/completions",
            ApiFamily::Ollama => "/api/chat",
        }
    }

    pub fn models_path(self) -> &'static str {
        match self {
            ApiFamily::OpenAi => "/v1/models",
            ApiFamily::Ollama => "/api/tags",
        }
    }

    pub fn embeddings_path(self) -> &'static str {
        match self {
            ApiFamily::OpenAi => "/v1/embeddings",
            ApiFamily::Ollama => "/api/embed",
        }
    }

    /// Where a locally running server of this family listens by default.
    pub fn default_base_url(self) -> &'static str {
        match self {
            ApiFamily::OpenAi => "http://localhost:1234",
            ApiFamily::Ollama => "http://localhost:11434",
        }
    }
}

/// HTTP transport options.
///
/// # Example
/// ```rust
/// use apiprobe::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::new("http://localhost:11434")
///     .with_timeout(Duration::from_secs(30))
///     .with_header("X-Trace".to_string(), "probe".to_string());
/// assert_eq!(options.url("/api/tags"), "http://localhost:11434/api/tags");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Request timeout
    pub timeout: Option<Duration>,

    /// Sent as `Authorization: Bearer <key>` when set
    pub api_key: Option<SecretString>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Options pointing at the default local address of `family`.
    pub fn local(family: ApiFamily) -> Self {
        Self::new(family.default_base_url())
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Join `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Parse a `Name: value` header given on the command line.
///
/// # Example
/// ```
/// use apiprobe::options::parse_header;
///
/// assert_eq!(
///     parse_header("Authorization: Bearer sk-1"),
///     Ok(("Authorization".to_string(), "Bearer sk-1".to_string()))
/// );
/// assert!(parse_header("no-colon").is_err());
/// ```
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got {s:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {s:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_is_redacted() {
        let options = TransportOptions::new("http://x").with_api_key("sk-secret");
        let debug = format!("{options:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_url_joining() {
        let options = TransportOptions::new("http://localhost:1234/");
        assert_eq!(options.url("/v1/models"), "http://localhost:1234/v1/models");
        assert_eq!(options.url("v1/models"), "http://localhost:1234/v1/models");
        assert_eq!(
            options.url("/messages/?session_id=abc"),
            "http://localhost:1234/messages/?session_id=abc"
        );
    }

    #[test]
    fn test_family_paths() {
        assert_eq!(ApiFamily::OpenAi.wire_format(), WireFormat::Sse);
        assert_eq!(ApiFamily::Ollama.wire_format(), WireFormat::LineJson);
        assert_eq!(ApiFamily::Ollama.models_path(), "/api/tags");
        assert_eq!(ApiFamily::OpenAi.embeddings_path(), "/v1/embeddings");
        assert_eq!(
            TransportOptions::local(ApiFamily::Ollama).url(ApiFamily::Ollama.chat_path()),
            "http://localhost:11434/api/chat"
        );
    }

    #[test]
    fn test_with_header_accumulates() {
        let options = TransportOptions::default()
            .with_header("A".to_string(), "1".to_string())
            .with_header("B".to_string(), "2".to_string());
        let headers = options.extra_headers.expect("headers set");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("B").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parse_header_keeps_colons_in_value() {
        assert_eq!(
            parse_header("X-Url: http://a:1"),
            Ok(("X-Url".to_string(), "http://a:1".to_string()))
        );
        assert!(parse_header(": v").is_err());
    }
}
