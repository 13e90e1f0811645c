//! rdkafka-backed admin port.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use status_relay_core::{KafkaConfig, TopicSpec};
use status_relay_readiness::{
    AdminPort, CreationOutcome, PortError, TopicCreationStatus, TopicListing,
};
use tracing::{debug, info};

use crate::error::{KafkaError, Result};

/// Admin port talking to a Kafka cluster.
pub struct KafkaAdminClient {
    admin: Arc<AdminClient<DefaultClientContext>>,
    timeout: Duration,
}

impl std::fmt::Debug for KafkaAdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaAdminClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl KafkaAdminClient {
    /// Create an admin client for the configured bootstrap servers.
    ///
    /// # Errors
    ///
    /// Returns [`KafkaError::Client`] if rdkafka rejects the configuration.
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .create()
            .map_err(|e| KafkaError::Client(format!("failed to create admin client: {e}")))?;

        info!(bootstrap_servers = %config.bootstrap_servers, "Kafka admin client created");
        Ok(Self {
            admin: Arc::new(admin),
            timeout: config.admin_timeout(),
        })
    }
}

#[async_trait]
impl AdminPort for KafkaAdminClient {
    async fn create_topics(
        &self,
        specs: &[TopicSpec],
    ) -> std::result::Result<CreationOutcome, PortError> {
        let topics = specs
            .iter()
            .map(new_topic)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let options = AdminOptions::new().operation_timeout(Some(self.timeout));

        let results = self
            .admin
            .create_topics(&topics, &options)
            .await
            .map_err(|e| PortError::AdminUnavailable(e.to_string()))?;

        let outcome = classify_results(results);
        for (name, status) in &outcome.results {
            debug!(topic = %name, ?status, "Topic creation result");
        }
        Ok(outcome)
    }

    async fn list_topics(&self) -> std::result::Result<Vec<TopicListing>, PortError> {
        let admin = Arc::clone(&self.admin);
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            let metadata = admin
                .inner()
                .fetch_metadata(None, timeout)
                .map_err(|e| {
                    PortError::AdminUnavailable(format!("failed to fetch metadata: {e}"))
                })?;

            Ok(metadata
                .topics()
                .iter()
                .filter(|topic| topic.error().is_none())
                .map(|topic| TopicListing::new(topic.name()))
                .collect())
        })
        .await
        .map_err(|e| PortError::AdminUnavailable(format!("metadata task failed: {e}")))?
    }
}

fn new_topic(spec: &TopicSpec) -> std::result::Result<NewTopic<'_>, PortError> {
    let partitions = i32::try_from(spec.partition_count).map_err(|_| {
        PortError::AdminUnavailable(format!("partition count out of range for {}", spec.name))
    })?;
    let replication = i32::try_from(spec.replication_factor).map_err(|_| {
        PortError::AdminUnavailable(format!("replication factor out of range for {}", spec.name))
    })?;
    Ok(NewTopic::new(
        &spec.name,
        partitions,
        TopicReplication::Fixed(replication),
    ))
}

/// Map per-topic broker results onto creation statuses.
///
/// `TopicAlreadyExists` is not an error.
fn classify_results(
    results: Vec<std::result::Result<String, (String, RDKafkaErrorCode)>>,
) -> CreationOutcome {
    let results = results
        .into_iter()
        .map(|result| match result {
            Ok(name) => (name, TopicCreationStatus::Created),
            Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                (name, TopicCreationStatus::AlreadyExists)
            }
            Err((name, code)) => (name, TopicCreationStatus::Rejected(code.to_string())),
        })
        .collect();
    CreationOutcome { results }
}
