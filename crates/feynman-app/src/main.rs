use std::ops::ControlFlow;
use tokio::io::{AsyncBufReadExt, BufReader};

use feynman_app::{config::Config, logging::init_logging, AppState, Command, Driver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.logging);

    tracing::info!("Starting Feynman chat client");
    tracing::info!("Backend: {} (mode {:?})", config.server.base_url, config.chat.mode);
    if config.session_cookie.is_none() {
        tracing::warn!("FEYNMAN_SESSION_COOKIE is not set; the backend may refuse requests");
    }

    let state = AppState::new(config)?;

    match state.session.load_threads().await {
        Ok(count) => tracing::info!("Loaded {} threads", count),
        Err(e) => tracing::warn!("Could not load threads: {}", e),
    }

    let mut driver = Driver::new(state);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type a message, or /help for commands.");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                if driver.on_interrupt().is_break() {
                    break;
                }
                continue;
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match driver.execute(command).await {
            Ok(ControlFlow::Break(())) => break,
            Ok(ControlFlow::Continue(())) => {}
            Err(e) => eprintln!("{}", e),
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
