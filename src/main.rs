//! flarerelay HTTP server
//!
//! Starts an Axum web server that relays generation requests to Workers AI
//! and OpenRouter.

use clap::Parser;
use flarerelay::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        workers_ai_configured = config.cloudflare.credentials().is_ok(),
        openrouter_configured = config.openrouter.api_key().is_ok(),
        workers_ai_model = config.cloudflare.model(),
        openrouter_model = config.openrouter.model(),
        "Starting flarerelay server on {}:{}",
        config.server.host,
        config.server.port
    );

    let host = config.server.host.parse::<IpAddr>().unwrap_or_else(|_| {
        tracing::warn!(
            host = %config.server.host,
            "Invalid server.host, binding to 0.0.0.0"
        );
        IpAddr::from([0, 0, 0, 0])
    });
    let addr = SocketAddr::from((host, config.server.port));

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
