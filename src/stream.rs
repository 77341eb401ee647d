//! Streaming response decoding.
//!
//! A [`StreamDecoder`] turns the lines of a streaming chat response into
//! [`DeltaEvent`]s. Two wire formats are understood, selected up front via
//! [`WireFormat`]:
//!
//! - [`WireFormat::Sse`]: `data:`-prefixed chat-completion chunks terminated
//!   by a `data: [DONE]` sentinel (OpenAI-compatible servers).
//! - [`WireFormat::LineJson`]: one bare JSON object per line, ending when the
//!   connection closes (Ollama).
//!
//! Decoding is pull-based and lazy: each event is produced as soon as its
//! source line has been read.

use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientError;
use crate::{ndjson, sse};

/// One incremental fragment of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeltaEvent {
    /// Content fragment, empty when the chunk carried none.
    pub text: String,

    /// Set only on the terminal event of a stream.
    pub done: bool,
}

impl DeltaEvent {
    /// A non-terminal event carrying `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }

    /// The terminal event emitted for an explicit end-of-stream marker.
    pub fn done() -> Self {
        Self {
            text: String::new(),
            done: true,
        }
    }
}

/// Errors raised while decoding a single line.
///
/// An absent optional field is never an error; only JSON that fails to parse
/// or parses into the wrong shape is reported.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed chunk {line:?}: {source}")]
    MalformedChunk {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected chunk shape {line:?}: {source}")]
    UnexpectedShape {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Classify a `serde_json` failure: syntax and truncation errors mean the
    /// payload is not JSON at all, data errors mean it is JSON of the wrong shape.
    pub(crate) fn from_json(line: &str, source: serde_json::Error) -> Self {
        let line = line.to_string();
        if source.is_data() {
            DecodeError::UnexpectedShape { line, source }
        } else {
            DecodeError::MalformedChunk { line, source }
        }
    }

    /// The offending line.
    pub fn line(&self) -> &str {
        match self {
            DecodeError::MalformedChunk { line, .. } | DecodeError::UnexpectedShape { line, .. } => {
                line
            }
        }
    }
}

/// Framing of a streaming response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `data: <json>` lines with a `[DONE]` sentinel.
    Sse,
    /// Newline-delimited JSON objects, no sentinel.
    LineJson,
}

impl WireFormat {
    /// Decode `lines` lazily in this format.
    pub fn decode<I>(self, lines: I) -> Deltas<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        StreamDecoder::new(self).decode(lines)
    }
}

/// Line-at-a-time decoder for one streaming response.
///
/// The only state carried between lines is whether a terminal event has been
/// seen. For [`WireFormat::Sse`] that also stops decoding: every line after
/// the sentinel is ignored.
#[derive(Debug, Clone)]
pub struct StreamDecoder {
    format: WireFormat,
    saw_done: bool,
}

impl StreamDecoder {
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            saw_done: false,
        }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Whether a `done = true` event has been emitted.
    ///
    /// A line-JSON stream that closes while this is still false completed
    /// implicitly.
    pub fn saw_done(&self) -> bool {
        self.saw_done
    }

    /// Whether further lines are ignored.
    pub fn is_terminated(&self) -> bool {
        self.format == WireFormat::Sse && self.saw_done
    }

    /// Decode a single line.
    ///
    /// Returns `None` when the line produces no event: blank lines, SSE lines
    /// without a `data:` field, and anything after the SSE sentinel.
    pub fn decode_line(&mut self, line: &str) -> Option<Result<DeltaEvent, DecodeError>> {
        if self.is_terminated() {
            return None;
        }
        if line.trim().is_empty() {
            return None;
        }

        let result = match self.format {
            WireFormat::Sse => sse::decode_line(line)?,
            WireFormat::LineJson => ndjson::decode_line(line),
        };

        if let Ok(event) = &result {
            if event.done {
                self.saw_done = true;
            }
        }
        Some(result)
    }

    /// Adapt an iterator of lines into a lazy iterator of events.
    pub fn decode<I>(self, lines: I) -> Deltas<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Deltas {
            lines: lines.into_iter(),
            decoder: self,
        }
    }
}

/// Iterator returned by [`StreamDecoder::decode`].
///
/// Stops pulling from the underlying lines once the stream has terminated.
#[derive(Debug, Clone)]
pub struct Deltas<I> {
    lines: I,
    decoder: StreamDecoder,
}

impl<I> Deltas<I> {
    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }
}

impl<I> Iterator for Deltas<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<DeltaEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.decoder.is_terminated() {
            let line = self.lines.next()?;
            let line = line.as_ref();
            if let Some(result) = self.decoder.decode_line(line) {
                return Some(result);
            }
            tracing::trace!(line = %line, "skipped line");
        }
        None
    }
}

impl<I> std::iter::FusedIterator for Deltas<I>
where
    I: std::iter::FusedIterator,
    I::Item: AsRef<str>,
{
}

/// Async counterpart of [`StreamDecoder::decode`] over a stream of lines.
///
/// Line-source errors are passed through unchanged and do not end the stream;
/// the stream ends after the SSE sentinel or when `lines` is exhausted.
pub fn decode_stream<S>(
    lines: S,
    format: WireFormat,
) -> impl Stream<Item = Result<DeltaEvent, ClientError>> + Send
where
    S: Stream<Item = Result<String, ClientError>> + Send,
{
    stream::unfold(
        (Box::pin(lines), StreamDecoder::new(format)),
        |(mut lines, mut decoder)| async move {
            while !decoder.is_terminated() {
                match lines.next().await {
                    Some(Ok(line)) => {
                        if let Some(result) = decoder.decode_line(&line) {
                            return Some((result.map_err(ClientError::from), (lines, decoder)));
                        }
                        tracing::trace!(line = %line, "skipped line");
                    }
                    Some(Err(e)) => return Some((Err(e), (lines, decoder))),
                    None => {
                        match decoder.format() {
                            WireFormat::Sse => {
                                tracing::warn!("SSE stream closed without [DONE] sentinel")
                            }
                            WireFormat::LineJson if !decoder.saw_done() => {
                                tracing::debug!("line-JSON stream closed, treating as completion")
                            }
                            WireFormat::LineJson => {}
                        }
                        return None;
                    }
                }
            }
            None
        },
    )
}
