//! Server-Sent Events (SSE) framing for OpenAI-compatible chat streams.
//!
//! SSE format:
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//!
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//!
//! data: [DONE]
//! ```

use std::fmt;

use serde::de::{Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::Deserialize;

use crate::stream::{DecodeError, DeltaEvent};

/// Parse an SSE line to extract the data portion.
///
/// The `data:` prefix and at most one following space are removed; the rest
/// of the payload is returned untouched.
///
/// # Example
/// ```
/// use apiprobe::sse::parse_sse_line;
///
/// assert_eq!(parse_sse_line("data: {\"key\": \"value\"}"), Some("{\"key\": \"value\"}"));
/// assert_eq!(parse_sse_line("data:[DONE]"), Some("[DONE]"));
/// assert_eq!(parse_sse_line("event: message"), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data))
}

/// Check if an SSE data payload indicates the stream is done.
///
/// # Example
/// ```
/// use apiprobe::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker(""));
/// assert!(!is_done_marker("{\"data\": \"value\"}"));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data == "[DONE]"
}

/// Decode one SSE line into an event.
///
/// `None` means the line carries no data field and is skipped.
pub(crate) fn decode_line(line: &str) -> Option<Result<DeltaEvent, DecodeError>> {
    let data = parse_sse_line(line)?;
    if is_done_marker(data) {
        return Some(Ok(DeltaEvent::done()));
    }

    let chunk = match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk,
        Err(e) => return Some(Err(DecodeError::from_json(data, e))),
    };

    Some(Ok(DeltaEvent::text(chunk.into_content())))
}

// --- OpenAI Streaming Chunk Types ---

/// `chat.completion.chunk` object. Only the path to the content is modelled;
/// every level may be missing or `null`.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Option<FirstChoice>,
}

/// The `choices` array, keeping only its first element. Later elements are
/// skipped without being checked against [`ChunkChoice`].
#[derive(Debug)]
struct FirstChoice(Option<ChunkChoice>);

impl<'de> Deserialize<'de> for FirstChoice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FirstChoiceVisitor;

        impl<'de> Visitor<'de> for FirstChoiceVisitor {
            type Value = FirstChoice;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of choices")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<FirstChoice, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let first = seq.next_element::<Option<ChunkChoice>>()?.flatten();
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(FirstChoice(first))
            }
        }

        deserializer.deserialize_seq(FirstChoiceVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionChunk {
    fn into_content(self) -> String {
        self.choices
            .and_then(|FirstChoice(choice)| choice)
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .unwrap_or_default()
    }
}
