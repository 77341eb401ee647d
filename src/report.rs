//! Human-readable rendering of probe responses.
//!
//! Output layout:
//!
//! ```text
//!
//! GET http://localhost:11434/api/tags
//!
//! Status Code: 200
//! Response Headers: {"content-type":"application/json; charset=utf-8"}
//! Response Body: {"models":[]}
//! ```

use itertools::Itertools;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};

use crate::client::{Body, RawResponse, ResponseHead};

/// How JSON is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// Two-space indented JSON.
    #[default]
    Pretty,
    /// Single-line JSON without spaces.
    Compact,
}

impl ReportStyle {
    pub fn json(self, value: &Value) -> String {
        let rendered = match self {
            ReportStyle::Pretty => serde_json::to_string_pretty(value),
            ReportStyle::Compact => serde_json::to_string(value),
        };
        // Serializing a `Value` cannot fail.
        rendered.unwrap_or_default()
    }
}

/// Headers as a JSON object; repeated headers are joined with `, `.
pub fn headers_json(headers: &HeaderMap) -> Value {
    let map: Map<String, Value> = headers
        .keys()
        .map(|name| {
            let value = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()))
                .join(", ");
            (name.to_string(), Value::String(value))
        })
        .collect();
    Value::Object(map)
}

/// Request line, status and headers.
pub fn render_head(head: &ResponseHead, style: ReportStyle) -> String {
    format!(
        "\n{} {}\n\nStatus Code: {}\nResponse Headers: {}\n",
        head.method,
        head.url,
        head.status.as_u16(),
        style.json(&headers_json(&head.headers)),
    )
}

pub fn render_body(body: &Body, style: ReportStyle) -> String {
    match (body, style) {
        (Body::Json(value), ReportStyle::Pretty) => {
            format!("Response Body:\n{}\n", style.json(value))
        }
        (Body::Json(value), ReportStyle::Compact) => {
            format!("Response Body: {}\n", style.json(value))
        }
        (Body::Text(text), _) => format!("Response Body: {text}\n"),
    }
}

pub fn render(response: &RawResponse, style: ReportStyle) -> String {
    format!(
        "{}{}",
        render_head(&response.head, style),
        render_body(&response.body, style)
    )
}

/// Heading printed before the lines of a streamed body.
pub const EVENTS_HEADING: &str = "Events:\n";

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    fn head() -> ResponseHead {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        ResponseHead {
            method: Method::GET,
            url: "http://localhost:11434/api/tags".to_string(),
            status: StatusCode::OK,
            headers,
        }
    }

    #[test]
    fn test_headers_json_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(headers_json(&headers), json!({"set-cookie": "a=1, b=2"}));
    }

    #[test]
    fn test_render_compact() {
        let response = RawResponse {
            head: head(),
            body: Body::Json(json!({"models": [{"name": "qwen3:14b"}]})),
        };
        assert_eq!(
            render(&response, ReportStyle::Compact),
            "\nGET http://localhost:11434/api/tags\n\n\
             Status Code: 200\n\
             Response Headers: {\"content-type\":\"application/json\"}\n\
             Response Body: {\"models\":[{\"name\":\"qwen3:14b\"}]}\n"
        );
    }

    #[test]
    fn test_render_pretty_body() {
        let body = Body::Json(json!({"object": "list"}));
        assert_eq!(
            render_body(&body, ReportStyle::Pretty),
            "Response Body:\n{\n  \"object\": \"list\"\n}\n"
        );
    }

    #[test]
    fn test_render_text_body_verbatim() {
        let body = Body::Text("Accepted".to_string());
        assert_eq!(render_body(&body, ReportStyle::Pretty), "Response Body: Accepted\n");
        assert_eq!(render_body(&body, ReportStyle::Compact), "Response Body: Accepted\n");
    }

    #[test]
    fn test_non_ascii_is_not_escaped() {
        let body = Body::Json(json!({"input": "今天人多吗"}));
        assert!(render_body(&body, ReportStyle::Compact).contains("今天人多吗"));
    }
}
