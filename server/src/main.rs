//! Device Registry Server
//!
//! HTTP gateway over the ENS-bound device registry: provisions per-user
//! registries, adds proof-gated devices and manages app permissions.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod extractors;
mod handlers;
mod models;
mod routes;
mod services;


use config::Config;
use services::registry::RegistryService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "device_registry_server=debug,device_registry=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Device Registry Server");
    tracing::info!("Chain: {}", config.chain_id);
    tracing::info!("Directory: {}", config.directory_address);
    tracing::info!("Authority: {}", config.authority_address);

    let registry = RegistryService::new(&config);
    let state = handlers::AppState::new(config.clone(), registry);
    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
