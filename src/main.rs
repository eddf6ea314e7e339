//! # Social Server
//!
//! Entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database pool, rate-limit backend and media storage
//! - HTTP server

use anyhow::Result;
use tracing::info;

use social_server::config::Settings;
use social_server::presentation::http::handlers::health::init_server_start;
use social_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    social_server::telemetry::init_tracing();
    init_server_start();

    info!("Starting Social Server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
