//! Newline-delimited JSON framing for Ollama chat streams.
//!
//! Every line of the body is a complete chunk; the last one sets `"done": true`
//! and carries timing and token counts instead of content.

use serde::Deserialize;

use crate::stream::{DecodeError, DeltaEvent};

/// Decode one NDJSON line into an event.
pub(crate) fn decode_line(line: &str) -> Result<DeltaEvent, DecodeError> {
    let chunk: ChatChunk =
        serde_json::from_str(line).map_err(|e| DecodeError::from_json(line, e))?;

    Ok(DeltaEvent {
        text: chunk.message.and_then(|m| m.content).unwrap_or_default(),
        done: chunk.done.unwrap_or(false),
    })
}

/// Ollama `/api/chat` streaming chunk.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    /// The message content (partial).
    #[serde(default)]
    message: Option<ChunkMessage>,
    /// Whether this is the final chunk.
    #[serde(default)]
    done: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: Option<String>,
}
