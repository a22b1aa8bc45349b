// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{routing::{get, post}, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::vitals_service::VitalsService;
use crate::infrastructure::config::{load_telemetry_config, load_vitals_config};
use crate::infrastructure::http_repository::HttpVitalsRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{device_vitals, health_check, trend_from_records};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let telemetry_config = load_telemetry_config()?;
    let vitals_config = load_vitals_config()?;
    let options = vitals_config.trend_options();

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpVitalsRepository::new(&telemetry_config.telemetry)?);

    // Create services (application layer)
    let vitals_service = VitalsService::new(repository, options, vitals_config.cache_ttl());

    // Create application state
    let state = Arc::new(AppState { vitals_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/devices/:device_id/vitals", get(device_vitals))
        .route("/vitals/trend", post(trend_from_records))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = vitals_config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", vitals_config.server.bind))?;
    tracing::info!(
        "Starting vitals-telemetry service on {} (telemetry source {}, naive zone {:?}, untimed {:?})",
        addr,
        telemetry_config.telemetry.base_url,
        options.zone,
        options.untimed
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
