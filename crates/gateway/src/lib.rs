//! API Gateway Library
//!
//! HTTP REST surface over an in-process identity directory.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::GatewayConfig;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the directory from configuration and serve HTTP until shutdown.
pub async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let directory = Arc::new(directory_service_lib::build_directory(&config.directory).await?);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(directory, config);

    let app = create_router(state).layer(TraceLayer::new_for_http());

    info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
