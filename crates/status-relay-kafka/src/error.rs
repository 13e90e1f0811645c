//! Error types for the Kafka adapters.

use thiserror::Error;

/// Errors raised by the Kafka admin, codec and publisher.
#[derive(Error, Debug)]
pub enum KafkaError {
    /// The rdkafka client could not be created.
    #[error("Kafka client error: {0}")]
    Client(String),

    /// A record could not be encoded.
    #[error("Avro encoding failed: {0}")]
    Encoding(String),

    /// The broker did not acknowledge a record.
    #[error("Failed to deliver record to {topic}: {reason}")]
    Delivery {
        /// Destination topic.
        topic: String,
        /// Broker or client failure description.
        reason: String,
    },

    /// Pending records could not be flushed.
    #[error("Producer flush failed: {0}")]
    Flush(String),
}

impl KafkaError {
    /// Check if this error is retriable.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Delivery { .. } | Self::Flush(_))
    }
}

impl From<apache_avro::Error> for KafkaError {
    fn from(err: apache_avro::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

/// A specialized Result type for Kafka operations.
pub type Result<T> = std::result::Result<T, KafkaError>;
