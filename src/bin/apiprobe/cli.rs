//! CLI definitions for apiprobe

use std::time::Duration;

use apiprobe::options::{parse_header, ApiFamily, TransportOptions};
use apiprobe::report::ReportStyle;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "apiprobe")]
#[command(about = "Send one request to an LLM or MCP server and print the response", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where and how to reach the server.
#[derive(Args)]
pub struct ServerArgs {
    /// API family spoken by the server
    #[arg(short, long, value_enum, env = "APIPROBE_FAMILY", default_value = "ollama", global = true)]
    pub family: ApiFamily,

    /// Base URL (defaults to the family's local address)
    #[arg(long, env = "APIPROBE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Sent as a bearer token
    #[arg(long, env = "APIPROBE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Extra header, `Name: value` (repeatable; `;`-separated in the environment)
    #[arg(
        short = 'H',
        long = "header",
        env = "APIPROBE_HEADERS",
        value_parser = parse_header,
        value_delimiter = ';',
        global = true
    )]
    pub headers: Vec<(String, String)>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// HTTP proxy URL
    #[arg(long, global = true)]
    pub proxy: Option<String>,
}

impl ServerArgs {
    pub fn transport_options(&self) -> TransportOptions {
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| self.family.default_base_url().to_string());

        let mut options = TransportOptions::new(base_url);
        if let Some(secs) = self.timeout {
            options = options.with_timeout(Duration::from_secs(secs));
        }
        if let Some(proxy) = &self.proxy {
            options = options.with_proxy(proxy.clone());
        }
        if let Some(api_key) = &self.api_key {
            options = options.with_api_key(api_key.as_str());
        }
        for (name, value) in &self.headers {
            options = options.with_header(name.clone(), value.clone());
        }
        options
    }
}

impl Cli {
    pub fn style(&self) -> ReportStyle {
        if self.compact {
            ReportStyle::Compact
        } else {
            ReportStyle::Pretty
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available models
    Models,

    /// Compute embeddings
    Embed {
        /// Embedding model
        #[arg(short, long)]
        model: String,

        /// Texts to embed
        #[arg(required = true)]
        input: Vec<String>,
    },

    /// Stream a chat completion
    Chat {
        /// Model to use
        #[arg(short, long)]
        model: String,

        /// System prompt
        #[arg(long)]
        system: Option<String>,

        /// Maximum tokens to generate (OpenAI family)
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Context window size (Ollama family)
        #[arg(long)]
        num_ctx: Option<u32>,

        /// Seconds to keep the model loaded (Ollama family)
        #[arg(long)]
        keep_alive: Option<u64>,

        /// Print the raw stream lines instead of decoded text
        #[arg(long)]
        raw: bool,

        /// User message
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// MCP session handshake over the SSE transport
    #[command(subcommand)]
    Mcp(McpCommands),
}

#[derive(Subcommand)]
pub enum McpCommands {
    /// Open a session event stream and print its events
    Session {
        /// Path of the SSE endpoint
        #[arg(long, default_value = "/sse")]
        path: String,
    },

    /// Send `initialize`
    Initialize {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Send `notifications/initialized`
    Initialized {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Send `tools/list`
    Tools {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Args)]
pub struct SessionArgs {
    /// Session id announced by the `endpoint` event
    #[arg(long, env = "APIPROBE_SESSION_ID")]
    pub session_id: String,

    /// JSON-RPC request id
    #[arg(long, default_value = "apiprobe")]
    pub id: String,
}
