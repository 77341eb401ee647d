//! Model Context Protocol handshake over the SSE transport.
//!
//! The client opens an event stream; the server's first event names the
//! endpoint that JSON-RPC messages for this session are POSTed to:
//!
//! ```text
//! event: endpoint
//! data: /messages/?session_id=9f1c...
//! ```
//!
//! The handshake is then `initialize`, `notifications/initialized`, after
//! which requests such as `tools/list` may be sent.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::sse::parse_sse_line;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// A JSON-RPC 2.0 request, or a notification when `id` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcMessage {
    pub fn request(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.into(),
            params: None,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Identifies this client in `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `initialize` request advertising sampling and root-list support.
pub fn initialize(id: impl Into<Value>, client_info: &ClientInfo) -> JsonRpcMessage {
    JsonRpcMessage::request(
        id,
        "initialize",
        Some(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "sampling": {},
                "roots": {"listChanged": true}
            },
            "clientInfo": {
                "name": client_info.name,
                "version": client_info.version
            }
        })),
    )
}

/// `notifications/initialized`, sent once the `initialize` result arrived.
pub fn initialized() -> JsonRpcMessage {
    JsonRpcMessage::notification("notifications/initialized")
}

pub fn tools_list(id: impl Into<Value>) -> JsonRpcMessage {
    JsonRpcMessage::request(id, "tools/list", None)
}

/// Path JSON-RPC messages for `session_id` are posted to.
pub fn messages_path(session_id: &str) -> String {
    format!("/messages/?session_id={session_id}")
}

/// Extract the session id from an endpoint URI such as
/// `/messages/?session_id=abc`.
///
/// # Example
/// ```
/// use apiprobe::mcp::session_id_from_endpoint;
///
/// assert_eq!(session_id_from_endpoint("/messages/?session_id=abc&x=1"), Some("abc"));
/// assert_eq!(session_id_from_endpoint("/messages/"), None);
/// ```
pub fn session_id_from_endpoint(endpoint: &str) -> Option<&str> {
    let (_, query) = endpoint.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "session_id")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Watches session event lines for the `endpoint` event.
#[derive(Debug, Default)]
pub struct EndpointWatcher {
    in_endpoint_event: bool,
}

impl EndpointWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event-stream line; returns the endpoint URI once its data
    /// line has been seen.
    pub fn observe(&mut self, line: &str) -> Option<String> {
        if let Some(event) = line.strip_prefix("event:") {
            self.in_endpoint_event = event.trim() == "endpoint";
            return None;
        }
        if !self.in_endpoint_event {
            return None;
        }
        let data = parse_sse_line(line)?;
        self.in_endpoint_event = false;
        Some(data.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_message() {
        let client_info = ClientInfo {
            name: "probe".to_string(),
            version: "0.3.1".to_string(),
        };
        let message = initialize("py-mcp-test", &client_info);
        assert_eq!(
            serde_json::to_value(&message).expect("serializable"),
            json!({
                "jsonrpc": "2.0",
                "id": "py-mcp-test",
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {"sampling": {}, "roots": {"listChanged": true}},
                    "clientInfo": {"name": "probe", "version": "0.3.1"}
                }
            })
        );
    }

    #[test]
    fn test_initialized_is_notification() {
        let message = initialized();
        assert!(message.is_notification());
        assert_eq!(
            serde_json::to_value(&message).expect("serializable"),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
        );
    }

    #[test]
    fn test_tools_list_numeric_id() {
        let message = tools_list(2);
        assert_eq!(
            serde_json::to_value(&message).expect("serializable"),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})
        );
    }

    #[test]
    fn test_session_id_from_endpoint() {
        assert_eq!(session_id_from_endpoint("/messages/?session_id=abc"), Some("abc"));
        assert_eq!(
            session_id_from_endpoint("http://h/messages/?x=1&session_id=def"),
            Some("def")
        );
        assert_eq!(session_id_from_endpoint("/messages/?session_id="), None);
        assert_eq!(session_id_from_endpoint("/messages/?other=1"), None);
        assert_eq!(messages_path("abc"), "/messages/?session_id=abc");
    }

    #[test]
    fn test_endpoint_watcher() {
        let mut watcher = EndpointWatcher::new();
        assert_eq!(watcher.observe(": ping"), None);
        assert_eq!(watcher.observe("data: ignored"), None);
        assert_eq!(watcher.observe("event: endpoint"), None);
        assert_eq!(
            watcher.observe("data: /messages/?session_id=9f1c"),
            Some("/messages/?session_id=9f1c".to_string())
        );
        assert_eq!(watcher.observe("data: /messages/?session_id=other"), None);

        watcher.observe("event: message");
        assert_eq!(watcher.observe("data: {\"jsonrpc\":\"2.0\"}"), None);
    }
}
