//! Probe client and error types.

use futures::Stream;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::http::{add_extra_headers, build_http_client, LinesResponseExt};
use crate::model::{ChatRequest, EmbeddingRequest};
use crate::options::{ApiFamily, TransportOptions};
use crate::stream::{decode_stream, DecodeError, DeltaEvent};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stream decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Response body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Provider error ({status}): {message}")]
    ProviderError { status: StatusCode, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Request line, status and headers of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseHead {
    fn new(method: Method, response: &reqwest::Response) -> Self {
        Self {
            method,
            url: response.url().to_string(),
            status: response.status(),
            headers: response.headers().clone(),
        }
    }

    /// Whether the `Content-Type` header announces JSON.
    pub fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"))
    }
}

/// Fully read response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

/// A buffered response, returned whatever its status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub head: ResponseHead,
    pub body: Body,
}

/// Issues the requests of one API family against one server.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    family: ApiFamily,
    transport_options: TransportOptions,
    http_client: reqwest::Client,
}

impl ProbeClient {
    pub fn new(family: ApiFamily, transport_options: TransportOptions) -> Result<Self, ClientError> {
        if transport_options.base_url.is_empty() {
            return Err(ClientError::Config("base URL is required".to_string()));
        }
        let http_client = build_http_client(&transport_options)?;
        Ok(Self {
            family,
            transport_options,
            http_client,
        })
    }

    pub fn family(&self) -> ApiFamily {
        self.family
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    /// List the models the server offers.
    pub async fn list_models(&self) -> Result<RawResponse, ClientError> {
        let req = self.request(Method::GET, self.family.models_path());
        self.send_buffered(req).await
    }

    /// Compute embeddings for every input string.
    pub async fn embed(&self, request: &EmbeddingRequest) -> Result<RawResponse, ClientError> {
        let req = self
            .request(Method::POST, self.family.embeddings_path())
            .json(request);
        self.send_buffered(req).await
    }

    /// POST a JSON body to an arbitrary path, e.g. an MCP session endpoint.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<RawResponse, ClientError> {
        let req = self.request(Method::POST, path).json(body);
        self.send_buffered(req).await
    }

    /// Start a streaming chat and decode it into deltas.
    ///
    /// A non-success status is reported as [`ClientError::ProviderError`]
    /// since an error body cannot be decoded as a stream.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<
        (
            ResponseHead,
            impl Stream<Item = Result<DeltaEvent, ClientError>> + Send,
        ),
        ClientError,
    > {
        let (head, lines) = self.chat_stream_lines(request).await?;
        Ok((head, decode_stream(lines, self.family.wire_format())))
    }

    /// Start a streaming chat and return the raw body lines.
    pub async fn chat_stream_lines(
        &self,
        request: &ChatRequest,
    ) -> Result<
        (
            ResponseHead,
            impl Stream<Item = Result<String, ClientError>> + Send,
        ),
        ClientError,
    > {
        let body = request.body(self.family)?;
        let req = self
            .request(Method::POST, self.family.chat_path())
            .json(&body);
        let (head, response) = self.send(req).await?;

        if !head.status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::handle_error_response(head.status, &body));
        }

        Ok((head, response.lines()))
    }

    /// GET a path and return its body as event lines, e.g. an MCP session.
    pub async fn open_event_stream(
        &self,
        path: &str,
    ) -> Result<
        (
            ResponseHead,
            impl Stream<Item = Result<String, ClientError>> + Send,
        ),
        ClientError,
    > {
        let req = self.request(Method::GET, path);
        let (head, response) = self.send(req).await?;
        Ok((head, response.lines()))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.transport_options.url(path);
        let req = self.http_client.request(method, url);
        add_extra_headers(req, &self.transport_options)
    }

    async fn send(
        &self,
        req: RequestBuilder,
    ) -> Result<(ResponseHead, reqwest::Response), ClientError> {
        let request = req.build()?;
        let method = request.method().clone();
        tracing::debug!(method = %method, url = %request.url(), "sending request");

        let response = self.http_client.execute(request).await?;
        let head = ResponseHead::new(method, &response);
        tracing::debug!(status = %head.status, "received response");
        Ok((head, response))
    }

    async fn send_buffered(&self, req: RequestBuilder) -> Result<RawResponse, ClientError> {
        let (head, response) = self.send(req).await?;
        let text = response.text().await?;

        let body = if head.is_json() {
            match serde_json::from_str(&text) {
                Ok(value) => Body::Json(value),
                Err(e) => {
                    tracing::warn!("JSON content type but unparsable body: {}", e);
                    Body::Text(text)
                }
            }
        } else {
            Body::Text(text)
        };

        Ok(RawResponse { head, body })
    }

    /// Handle error responses from either family.
    fn handle_error_response(status: StatusCode, body: &str) -> ClientError {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(ErrorResponse::into_message)
            .unwrap_or_else(|_| body.to_string());
        ClientError::ProviderError { status, message }
    }
}

/// `{"error": {"message": ...}}` (OpenAI) or `{"error": "..."}` (Ollama).
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Object { message: String },
}

impl ErrorResponse {
    fn into_message(self) -> String {
        match self.error {
            ErrorDetail::Message(message) | ErrorDetail::Object { message } => message,
        }
    }
}
