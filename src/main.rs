//! Lorekeeper HTTP server
//!
//! Starts an Axum web server hosting the universe chat and lore assistant
//! endpoints.

use clap::Parser;
use lorekeeper::{
    cli::{Cli, Command, generate_config_template},
    config::{Config, Credentials},
    handlers::{self, AppState},
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        match output {
            Some(path) => {
                std::fs::write(&path, generate_config_template())?;
                println!("Wrote configuration template to {}", path);
            }
            None => print!("{}", generate_config_template()),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting Lorekeeper server on {}:{}",
        config.server.host,
        config.server.port
    );

    let credentials = Credentials::from_env(&config);
    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    let state = AppState::new(Arc::new(config), credentials)?;
    let app = handlers::router(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Universe chat available at http://{}/universe-chat", addr);
    tracing::info!("Lore assistant available at http://{}/lore-assistant", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
