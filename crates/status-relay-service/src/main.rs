//! Status Relay - status stream to Kafka relay
//!
//! This is the main entry point for the relay service. It waits for the
//! Kafka topics and the schema registry, then streams statuses into Kafka.
//!
//! # HTTP Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /ready` - Readiness gate outcome

use status_relay_core::RelayConfig;
use status_relay_service::{app, routes};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,status_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RelayConfig::from_env();
    config.validate()?;

    tracing::info!("{}", config.stream.welcome_message);
    tracing::info!(
        bootstrap_servers = %config.kafka.bootstrap_servers,
        schema_registry_url = %config.kafka.schema_registry_url,
        topic = %config.kafka.topic_name,
        "Loaded relay configuration"
    );

    let app = app::build(&config)?;
    let shutdown = CancellationToken::new();

    // Start HTTP server
    let router = routes::create_router(app.readiness());
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
        }
    });

    // Ctrl-C cancels whatever phase is running
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    let result = app.run(shutdown.clone()).await;
    shutdown.cancel();
    server.await??;

    if let Err(e) = result {
        tracing::error!(error = %e, "Status relay stopped with an error");
        return Err(e.into());
    }

    tracing::info!("Status relay stopped");
    Ok(())
}
