//! # apiprobe
//!
//! Exercise OpenAI-compatible, Ollama and MCP endpoints by hand and decode
//! their streaming chat responses into text deltas.
//!
//! ## Features
//! - Lazy, line-at-a-time decoding of both chat streaming formats
//! - Async line splitting of HTTP response bodies
//! - A small reqwest client for chat, embeddings, model listing and the
//!   MCP SSE handshake
//! - Pretty or compact rendering of responses
//!
//! ## Decoding
//!
//! The decoder does not need a network connection; feed it lines from
//! anywhere:
//!
//! ```
//! use apiprobe::stream::{DeltaEvent, WireFormat};
//!
//! let lines = [
//!     r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
//!     r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#,
//!     "data: [DONE]",
//! ];
//! let events: Vec<DeltaEvent> = WireFormat::Sse
//!     .decode(lines)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(events.last(), Some(&DeltaEvent::done()));
//! assert_eq!(events.iter().map(|e| e.text.as_str()).collect::<String>(), "Hi");
//! ```
//!
//! ## Streaming a chat
//! ```no_run
//! use apiprobe::client::ProbeClient;
//! use apiprobe::model::{ChatMessage, ChatRequest};
//! use apiprobe::options::{ApiFamily, TransportOptions};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ProbeClient::new(
//!         ApiFamily::Ollama,
//!         TransportOptions::local(ApiFamily::Ollama),
//!     )?;
//!     let request = ChatRequest::new("qwen3:14b").with_message(ChatMessage::user("Who are you?"));
//!
//!     let (_head, stream) = client.chat_stream(&request).await?;
//!     futures::pin_mut!(stream);
//!     while let Some(event) = stream.next().await {
//!         print!("{}", event?.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod mcp;
pub mod model;
mod ndjson;
pub mod options;
pub mod report;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{ClientError, ProbeClient};
pub use options::{ApiFamily, TransportOptions};
pub use stream::{DecodeError, DeltaEvent, StreamDecoder, WireFormat};
