//! Desk-Bot - Main entry point.

use anyhow::Result;
use desk_bot::daemon::PollLoop;
use desk_bot::engine::ChatEngine;
use desk_bot::llm::CompletionClient;
use desk_bot::terminal::DesktopTerminal;
use desk_common::config::Config;
use desk_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Desk-Bot v{}", env!("CARGO_PKG_VERSION"));

    let client = CompletionClient::new(config.completion.clone());
    tracing::info!(endpoint = %client.endpoint(), "completion client ready");

    let engine = ChatEngine::new(client, config.bot.clone(), config.completion.max_tokens);
    let terminal = DesktopTerminal::new(config.terminal.clone())?;

    // Runs until the process is killed
    PollLoop::new(&config, engine, terminal).run().await;
    Ok(())
}
