//! apiprobe binary entry point

use anyhow::Result;

mod cli;
mod commands;

use apiprobe::ProbeClient;
use clap::Parser;
use cli::{Cli, Commands, McpCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the response
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let style = cli.style();
    let client = ProbeClient::new(cli.server.family, cli.server.transport_options())?;

    match cli.command {
        Commands::Models => commands::models(&client, style).await?,
        Commands::Embed { model, input } => commands::embed(&client, model, input, style).await?,
        Commands::Chat {
            model,
            system,
            max_tokens,
            temperature,
            num_ctx,
            keep_alive,
            raw,
            prompt,
        } => {
            let request = commands::chat_request(
                model,
                system,
                max_tokens,
                temperature,
                num_ctx,
                keep_alive,
                prompt,
            );
            commands::chat(&client, &request, raw, style).await?;
        }
        Commands::Mcp(McpCommands::Session { path }) => {
            commands::mcp_session(&client, &path, style).await?
        }
        Commands::Mcp(McpCommands::Initialize { session }) => {
            let message = apiprobe::mcp::initialize(session.id, &Default::default());
            commands::mcp_post(&client, &session.session_id, &message, style).await?
        }
        Commands::Mcp(McpCommands::Initialized { session }) => {
            let message = apiprobe::mcp::initialized();
            commands::mcp_post(&client, &session.session_id, &message, style).await?
        }
        Commands::Mcp(McpCommands::Tools { session }) => {
            let message = apiprobe::mcp::tools_list(session.id);
            commands::mcp_post(&client, &session.session_id, &message, style).await?
        }
    }

    Ok(())
}
