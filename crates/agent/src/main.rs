//! ClusterPulse agent - cluster metrics collection and task execution
//!
//! Serves the dashboard API: live cluster state with fixture fallback,
//! script execution with timeout enforcement, health and metrics probes.

use anyhow::Result;
use clusterpulse_agent::{api, config::AgentConfig};
use clusterpulse_lib::{
    cluster::{ClusterClient, Collector},
    health::{components, HealthRegistry},
    observability::{AgentMetrics, StructuredLogger},
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting clusterpulse-agent");

    // Load configuration
    let config = AgentConfig::load()?;
    info!(api_port = config.api_port, mock_fallback = config.mock_fallback, "Agent configured");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CONTROL_PLANE).await;
    health_registry.register(components::COLLECTOR).await;
    health_registry.register(components::TASK_RUNNER).await;

    // Initialize metrics and structured logging
    let metrics = AgentMetrics::new();
    let logger = StructuredLogger::new(format!("agent-{}", config.api_port));
    logger.log_startup(AGENT_VERSION);

    // Session is established lazily on the first collection call
    let cluster = ClusterClient::new(config.kubeconfig.as_deref().map(Path::new));
    let collector = Collector::new(cluster);

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        Arc::new(collector),
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
        config.mock_fallback,
        Duration::from_secs(config.default_task_timeout_secs),
    ));

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    api_handle.abort();

    Ok(())
}
