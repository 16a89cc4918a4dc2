//! Quayside Gateway - HTTP/WebSocket entry point for the live-support service.
//!
//! # Configuration
//!
//! Read from the environment:
//!
//! - `LISTEN_ADDR` - listen address (default `0.0.0.0:8080`)
//! - `DATA_DIR` - RocksDB data directory (default `/data/quayside`)
//! - `CLOSE_POLICY` - `any_agent` (default) or `assigned_agent_only`

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quayside_gateway::{create_router, ConnectionRegistry, GatewayConfig, GatewayState};
use quayside_routing::{ClosePolicy, RoutingConfig, RoutingEngine};
use quayside_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,quayside=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Quayside Gateway");

    // Load configuration from environment
    let listen_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/quayside".into());
    let close_policy = match std::env::var("CLOSE_POLICY").as_deref() {
        Ok("assigned_agent_only") => ClosePolicy::AssignedAgentOnly,
        _ => ClosePolicy::AnyAgent,
    };

    tracing::info!(
        listen_addr = %listen_addr,
        data_dir = %data_dir,
        close_policy = ?close_policy,
        "Gateway configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&data_dir)?);

    // Connection registry doubles as the engine's outbox
    let connections = Arc::new(ConnectionRegistry::new());

    let routing_config = RoutingConfig {
        close_policy,
        ..RoutingConfig::default()
    };
    let engine = Arc::new(RoutingEngine::new(
        Arc::clone(&store),
        Arc::clone(&connections),
        routing_config,
    ));
    tracing::info!("Routing engine initialized");

    // Build gateway state and configuration
    let gateway_config = GatewayConfig {
        listen_addr: listen_addr.clone(),
        ..GatewayConfig::default()
    };
    let state = GatewayState::new(engine, store, connections, gateway_config);

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
