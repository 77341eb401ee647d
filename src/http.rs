//! HTTP client utilities.
//!
//! Builds the reqwest client from [`TransportOptions`] and splits streaming
//! response bodies into lines for the decoders.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};

use crate::client::ClientError;
use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("invalid proxy {proxy_url:?}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Add the bearer key and extra headers from transport options to a request.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    transport_options: &TransportOptions,
) -> RequestBuilder {
    if let Some(api_key) = &transport_options.api_key {
        request = request.header(AUTHORIZATION, format!("Bearer {}", api_key.expose_secret()));
    }
    if let Some(headers) = &transport_options.extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Extension trait for `reqwest::Response` to read the body line by line.
pub trait LinesResponseExt {
    /// Convert the response into a stream of non-blank body lines.
    fn lines(self) -> impl Stream<Item = Result<String, ClientError>> + Send;
}

impl LinesResponseExt for reqwest::Response {
    fn lines(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        lines(self.bytes_stream())
    }
}

/// Split a byte stream into lines.
///
/// Line terminators (`\n` or `\r\n`) are removed and blank lines skipped.
/// Bytes are buffered until a full line is available, so chunk boundaries
/// may fall anywhere, including inside a multi-byte character. A trailing
/// line without terminator is yielded when the byte stream ends.
pub fn lines<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Send,
    ClientError: From<E>,
{
    stream::unfold(
        (Box::pin(byte_stream), Vec::<u8>::new(), false),
        |(mut byte_stream, mut buffer, mut stream_ended)| async move {
            loop {
                // Process complete lines from buffer
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=pos).collect();
                    match decode_line(raw) {
                        Ok(Some(line)) => {
                            return Some((Ok(line), (byte_stream, buffer, stream_ended)))
                        }
                        Ok(None) => continue,
                        Err(e) => return Some((Err(e), (byte_stream, buffer, stream_ended))),
                    }
                }

                if stream_ended {
                    if buffer.is_empty() {
                        return None;
                    }
                    let raw = std::mem::take(&mut buffer);
                    match decode_line(raw) {
                        Ok(Some(line)) => {
                            return Some((Ok(line), (byte_stream, buffer, stream_ended)))
                        }
                        Ok(None) => return None,
                        Err(e) => return Some((Err(e), (byte_stream, buffer, stream_ended))),
                    }
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        return Some((Err(ClientError::from(e)), (byte_stream, buffer, stream_ended)))
                    }
                    None => stream_ended = true,
                }
            }
        },
    )
}

/// Strip the terminator from a raw line; `None` for blank lines.
fn decode_line(mut raw: Vec<u8>) -> Result<Option<String>, ClientError> {
    if raw.last() == Some(&b'\n') {
        raw.pop();
    }
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    let line = String::from_utf8(raw)?;
    if line.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn split(chunks: Vec<&'static [u8]>) -> Vec<String> {
        let source = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, ClientError>(Bytes::from_static(c))),
        );
        lines(source)
            .map(|r| r.expect("line should decode"))
            .collect()
            .await
    }

    #[test]
    fn test_build_http_client() {
        let transport_options =
            TransportOptions::new("http://localhost:1234").with_timeout(Duration::from_secs(30));

        let client = build_http_client(&transport_options);
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let transport_options = TransportOptions::new("http://localhost:1234")
            .with_proxy("http://proxy.example.com:8080".to_string());

        let client = build_http_client(&transport_options);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_lines_across_chunk_boundaries() {
        let lines = split(vec![b"data: {\"a\"", b":1}\n\ndata: [DO", b"NE]\n"]).await;
        assert_eq!(lines, vec!["data: {\"a\":1}", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn test_lines_strip_crlf_and_skip_blank() {
        let lines = split(vec![b"one\r\n\r\n  \r\ntwo\r\n"]).await;
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_lines_multibyte_split() {
        // "你" is E4 BD A0
        let lines = split(vec![b"{\"c\":\"\xE4", b"\xBD\xA0\"}\n"]).await;
        assert_eq!(lines, vec!["{\"c\":\"你\"}"]);
    }

    #[tokio::test]
    async fn test_lines_trailing_unterminated() {
        let lines = split(vec![b"{\"done\":false}\n{\"done\":", b"true}"]).await;
        assert_eq!(lines, vec!["{\"done\":false}", "{\"done\":true}"]);
    }

    #[tokio::test]
    async fn test_lines_invalid_utf8() {
        let source = stream::iter(vec![Ok::<_, ClientError>(Bytes::from_static(b"\xFF\xFE\n"))]);
        let results: Vec<_> = lines(source).collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(ClientError::InvalidUtf8(_))));
    }
}
