//! # Vaccination Comparison API Server
//!
//! Binary entry point for the GraphQL and REST service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vax_api::{build_router, ApiContext, Config};
use vax_persistence::{DuckDbObservationStore, InMemoryObservationStore, ObservationStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(
        version = vax_api::VERSION,
        "Starting Vaccination Comparison API"
    );

    // Open the observation store
    let store: Arc<dyn ObservationStore> = match config.database_path {
        Some(ref path) => Arc::new(DuckDbObservationStore::open(path)?),
        None => {
            tracing::warn!("DATABASE_PATH not set, observations are kept in memory");
            Arc::new(InMemoryObservationStore::new())
        }
    };

    let countries = store.countries().await?;
    tracing::info!(stored_countries = countries.len(), "Observation store ready");

    // Build API context and router
    let api_ctx = ApiContext::new(store, config.default_countries.clone());

    tracing::info!(
        playground = config.enable_playground,
        max_depth = config.max_query_depth,
        max_complexity = config.max_query_complexity,
        defaults = ?config.default_countries,
        "GraphQL schema built"
    );

    let app = build_router(api_ctx, &config);

    // Start server
    let addr = config.server_addr;
    tracing::info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    if config.enable_playground {
        tracing::info!("GraphQL Playground available at http://{}/graphql", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
