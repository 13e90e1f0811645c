//! Composition root.

use std::sync::Arc;

use status_relay_core::RelayConfig;
use status_relay_kafka::{KafkaAdminClient, KafkaRecordPublisher, RecordPublisher};
use status_relay_readiness::{
    AdminPort, HttpRegistryHealth, ReadinessOrchestrator, RegistryHealthPort, Sleeper,
    TokioSleeper,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::Result;
use crate::init::StreamInitializer;
use crate::listener::StatusListener;
use crate::state::ReadinessHandle;
use crate::stream::{MockStreamRunner, StreamRunner};

/// The assembled service.
pub struct App {
    initializer: StreamInitializer,
    runner: Arc<dyn StreamRunner>,
    publisher: Arc<dyn RecordPublisher>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("initializer", &self.initializer)
            .finish_non_exhaustive()
    }
}

/// Build the service against a live cluster.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a client cannot be
/// created.
pub fn build(config: &RelayConfig) -> Result<App> {
    let admin = Arc::new(KafkaAdminClient::new(&config.kafka)?);
    let registry = Arc::new(HttpRegistryHealth::new(
        config.kafka.schema_registry_url.clone(),
        config.kafka.registry_probe_timeout(),
    )?);
    info!(url = %registry.url(), "Schema registry health check configured");
    let publisher = Arc::new(KafkaRecordPublisher::new(&config.kafka)?);

    assemble(config, admin, registry, publisher, Arc::new(TokioSleeper))
}

/// Build the service from prepared adapters.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn assemble(
    config: &RelayConfig,
    admin: Arc<dyn AdminPort>,
    registry: Arc<dyn RegistryHealthPort>,
    publisher: Arc<dyn RecordPublisher>,
    sleeper: Arc<dyn Sleeper>,
) -> Result<App> {
    config.validate()?;

    let orchestrator = ReadinessOrchestrator::from_config(
        config.kafka.topic_specs(),
        admin,
        registry,
        &config.retry,
        sleeper,
    )?;
    let initializer = StreamInitializer::new(orchestrator, ReadinessHandle::new());

    let listener = Arc::new(StatusListener::new(
        config.kafka.topic_name.clone(),
        Arc::clone(&publisher),
    ));
    let runner = Arc::new(MockStreamRunner::new(listener, config.stream.clone()));

    Ok(App {
        initializer,
        runner,
        publisher,
    })
}

impl App {
    /// Handle to the readiness outcome, for the HTTP handlers.
    #[must_use]
    pub fn readiness(&self) -> ReadinessHandle {
        self.initializer.readiness().clone()
    }

    /// Run the service until `shutdown` is cancelled.
    ///
    /// The stream only starts after the readiness gate passed. Cancelling
    /// during the gate abandons it without starting the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster never became ready or the stream
    /// failed. Pending records are flushed on the way out either way once
    /// the stream has started.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        tokio::select! {
            result = self.initializer.init() => { result?; }
            () = shutdown.cancelled() => {
                info!("Shutdown requested before the cluster became ready");
                return Ok(());
            }
        }

        let streamed = self.runner.run(shutdown).await;
        if let Err(e) = &streamed {
            warn!(error = %e, "Status stream failed");
        }

        self.publisher.close().await?;
        streamed
    }
}
