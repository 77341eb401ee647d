//! Request models for the probed endpoints.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::options::ApiFamily;

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Provider-agnostic streaming chat request.
///
/// Rendered into the family's wire body by [`ChatRequest::body`]; options a
/// family has no field for are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier (e.g. "qwen3:14b")
    pub model: String,

    /// Conversation history
    pub messages: Vec<ChatMessage>,

    /// Maximum tokens to generate (OpenAI only)
    pub max_tokens: Option<u32>,

    /// Temperature for sampling
    pub temperature: Option<f32>,

    /// Context window size, Ollama's `num_ctx`
    pub context_window: Option<u32>,

    /// How long Ollama keeps the model loaded after the request
    pub keep_alive: Option<Duration>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            max_tokens: None,
            temperature: None,
            context_window: None,
            keep_alive: None,
        }
    }

    /// Append a message.
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Set maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_context_window(mut self, context_window: u32) -> Self {
        self.context_window = Some(context_window);
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// The JSON body to send to `family`'s chat endpoint, with streaming on.
    pub fn body(&self, family: ApiFamily) -> serde_json::Result<Value> {
        match family {
            ApiFamily::OpenAi => serde_json::to_value(OpenAiChatBody::from(self)),
            ApiFamily::Ollama => serde_json::to_value(OllamaChatBody::from(self)),
        }
    }
}

/// Embedding request; both families accept the same body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: NonEmpty<String>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: NonEmpty<String>) -> Self {
        Self {
            model: model.into(),
            input,
        }
    }
}

// --- Wire bodies ---

#[derive(Debug, Serialize)]
struct OpenAiChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

impl<'a> From<&'a ChatRequest> for OpenAiChatBody<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "OllamaOptions::is_empty")]
    options: OllamaOptions,
    stream: bool,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

impl OllamaOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_ctx.is_none()
    }
}

impl<'a> From<&'a ChatRequest> for OllamaChatBody<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            options: OllamaOptions {
                temperature: request.temperature,
                num_ctx: request.context_window,
            },
            stream: true,
            keep_alive: request.keep_alive.map(|d| d.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> ChatRequest {
        ChatRequest::new("qwen3:14b")
            .with_message(ChatMessage::system("Your name is Jrag AI\n/no_think"))
            .with_message(ChatMessage::user("Who are you?"))
            .with_temperature(0.5)
            .with_context_window(32768)
            .with_max_tokens(512)
            .with_keep_alive(Duration::from_secs(3600))
    }

    #[test]
    fn test_openai_body() {
        let body = request().body(ApiFamily::OpenAi).expect("serializable");
        assert_eq!(
            body,
            json!({
                "model": "qwen3:14b",
                "messages": [
                    {"role": "system", "content": "Your name is Jrag AI\n/no_think"},
                    {"role": "user", "content": "Who are you?"}
                ],
                "max_tokens": 512,
                "temperature": 0.5,
                "stream": true
            })
        );
    }

    #[test]
    fn test_ollama_body() {
        let body = request().body(ApiFamily::Ollama).expect("serializable");
        assert_eq!(body["options"], json!({"temperature": 0.5, "num_ctx": 32768}));
        assert_eq!(body["keep_alive"], json!(3600));
        assert_eq!(body["stream"], json!(true));
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_ollama_body_omits_empty_options() {
        let body = ChatRequest::new("m")
            .with_message(ChatMessage::user("hi"))
            .body(ApiFamily::Ollama)
            .expect("serializable");
        assert_eq!(
            body,
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true
            })
        );
    }

    #[test]
    fn test_embedding_request_serializes_input_as_array() {
        let request = EmbeddingRequest::new(
            "nomic-embed-text:latest",
            NonEmpty {
                head: "first".to_string(),
                tail: vec!["second".to_string()],
            },
        );
        assert_eq!(
            serde_json::to_value(&request).expect("serializable"),
            json!({"model": "nomic-embed-text:latest", "input": ["first", "second"]})
        );
    }

    #[test]
    fn test_embedding_request_rejects_empty_input() {
        let parsed = serde_json::from_value::<EmbeddingRequest>(json!({"model": "m", "input": []}));
        assert!(parsed.is_err());
    }
}
