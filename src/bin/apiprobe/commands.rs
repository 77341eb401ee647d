//! Subcommand implementations

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use apiprobe::mcp::{self, EndpointWatcher, JsonRpcMessage};
use apiprobe::model::{ChatMessage, ChatRequest, EmbeddingRequest};
use apiprobe::report::{self, ReportStyle, EVENTS_HEADING};
use apiprobe::ProbeClient;
use futures::StreamExt;
use nonempty::NonEmpty;

pub async fn models(client: &ProbeClient, style: ReportStyle) -> Result<()> {
    let response = client.list_models().await?;
    print!("{}", report::render(&response, style));
    Ok(())
}

pub async fn embed(
    client: &ProbeClient,
    model: String,
    input: Vec<String>,
    style: ReportStyle,
) -> Result<()> {
    let input = NonEmpty::from_vec(input).context("at least one input text is required")?;
    let response = client.embed(&EmbeddingRequest::new(model, input)).await?;
    print!("{}", report::render(&response, style));
    Ok(())
}

pub fn chat_request(
    model: String,
    system: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    num_ctx: Option<u32>,
    keep_alive: Option<u64>,
    prompt: Vec<String>,
) -> ChatRequest {
    let mut request = ChatRequest::new(model);
    if let Some(system) = system {
        request = request.with_message(ChatMessage::system(system));
    }
    request = request.with_message(ChatMessage::user(prompt.join(" ")));
    if let Some(max_tokens) = max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    if let Some(temperature) = temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(num_ctx) = num_ctx {
        request = request.with_context_window(num_ctx);
    }
    if let Some(secs) = keep_alive {
        request = request.with_keep_alive(Duration::from_secs(secs));
    }
    request
}

pub async fn chat(
    client: &ProbeClient,
    request: &ChatRequest,
    raw: bool,
    style: ReportStyle,
) -> Result<()> {
    if raw {
        let (head, lines) = client.chat_stream_lines(request).await?;
        print!("{}{}", report::render_head(&head, style), EVENTS_HEADING);
        futures::pin_mut!(lines);
        while let Some(line) = lines.next().await {
            println!("{}", line?);
        }
        return Ok(());
    }

    let (head, deltas) = client.chat_stream(request).await?;
    print!("{}{}", report::render_head(&head, style), EVENTS_HEADING);
    futures::pin_mut!(deltas);

    let mut stdout = std::io::stdout();
    let mut saw_done = false;
    while let Some(event) = deltas.next().await {
        let event = event?;
        write!(stdout, "{}", event.text)?;
        stdout.flush()?;
        saw_done |= event.done;
    }
    writeln!(stdout)?;

    if !saw_done {
        tracing::info!("stream closed without a done event, treating as complete");
    }
    Ok(())
}

pub async fn mcp_session(client: &ProbeClient, path: &str, style: ReportStyle) -> Result<()> {
    let (head, lines) = client.open_event_stream(path).await?;
    print!("{}{}", report::render_head(&head, style), EVENTS_HEADING);
    futures::pin_mut!(lines);

    let mut watcher = EndpointWatcher::new();
    while let Some(line) = lines.next().await {
        let line = line?;
        println!("{line}");
        if let Some(endpoint) = watcher.observe(&line) {
            match mcp::session_id_from_endpoint(&endpoint) {
                Some(session_id) => tracing::info!(session_id, "session endpoint announced"),
                None => tracing::warn!(endpoint = %endpoint, "endpoint without session id"),
            }
        }
    }
    Ok(())
}

pub async fn mcp_post(
    client: &ProbeClient,
    session_id: &str,
    message: &JsonRpcMessage,
    style: ReportStyle,
) -> Result<()> {
    let response = client
        .post_json(&mcp::messages_path(session_id), message)
        .await?;
    print!("{}", report::render(&response, style));
    Ok(())
}
