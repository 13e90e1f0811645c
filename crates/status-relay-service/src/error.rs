//! Error types for the service.

use status_relay_core::CoreError;
use status_relay_kafka::KafkaError;
use status_relay_readiness::{PortError, ReadinessError};
use thiserror::Error;

/// Errors that abort the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),

    /// The cluster never became ready.
    #[error("Cluster not ready: {0}")]
    Readiness(#[from] ReadinessError),

    /// Kafka client error.
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    /// The schema registry client could not be set up.
    #[error("Schema registry error: {0}")]
    Registry(#[from] PortError),

    /// I/O error from the HTTP listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Whether this error happened while waiting for the cluster.
    #[must_use]
    pub fn is_readiness_failure(&self) -> bool {
        matches!(self, Self::Readiness(_))
    }
}

/// A specialized Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
