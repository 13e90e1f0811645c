//! Record publishing.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use status_relay_core::{KafkaConfig, StatusRecord};
use tracing::{debug, info};

use crate::codec::{encode_key, RecordCodec};
use crate::error::{KafkaError, Result};

/// Broker acknowledgement of a published record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Topic the record was written to.
    pub topic: String,
    /// Partition the record landed on.
    pub partition: i32,
    /// Offset of the record within the partition.
    pub offset: i64,
}

/// Publishes status records to a topic.
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    /// Send `record` to `topic`, keyed by `key`, and wait for the acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or is not acknowledged.
    async fn send(&self, topic: &str, key: i64, record: &StatusRecord) -> Result<Delivery>;

    /// Flush pending records. Called once on shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if pending records could not be flushed in time.
    async fn close(&self) -> Result<()>;
}

/// Publisher backed by an rdkafka `FutureProducer`.
pub struct KafkaRecordPublisher {
    producer: FutureProducer,
    codec: RecordCodec,
    timeout: Duration,
}

impl std::fmt::Debug for KafkaRecordPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaRecordPublisher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl KafkaRecordPublisher {
    /// Create a publisher for the configured bootstrap servers.
    ///
    /// # Errors
    ///
    /// Returns an error if the producer cannot be created or the record
    /// schema fails to parse.
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let timeout = config.producer_timeout();
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", "all")
            .create()
            .map_err(|e| KafkaError::Client(format!("failed to create producer: {e}")))?;

        Ok(Self {
            producer,
            codec: RecordCodec::new()?,
            timeout,
        })
    }
}

#[async_trait]
impl RecordPublisher for KafkaRecordPublisher {
    async fn send(&self, topic: &str, key: i64, record: &StatusRecord) -> Result<Delivery> {
        let payload = self.codec.encode(record)?;
        let key = encode_key(key);

        let (partition, offset) = self
            .producer
            .send(
                FutureRecord::to(topic).key(&key[..]).payload(&payload[..]),
                Timeout::After(self.timeout),
            )
            .await
            .map_err(|(err, _)| KafkaError::Delivery {
                topic: topic.to_string(),
                reason: err.to_string(),
            })?;

        Ok(Delivery {
            topic: topic.to_string(),
            partition,
            offset,
        })
    }

    async fn close(&self) -> Result<()> {
        info!("Closing Kafka producer");
        let producer = self.producer.clone();
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| KafkaError::Flush(format!("flush task failed: {e}")))?
            .map_err(|e| KafkaError::Flush(e.to_string()))?;

        debug!("Kafka producer flushed");
        Ok(())
    }
}

/// In-memory publisher for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;

    /// A record captured by [`MockPublisher`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentRecord {
        /// Destination topic.
        pub topic: String,
        /// Message key.
        pub key: i64,
        /// The record.
        pub record: StatusRecord,
    }

    /// Publisher that keeps every record in memory.
    #[derive(Debug, Default)]
    pub struct MockPublisher {
        sent: Mutex<Vec<SentRecord>>,
        failures: Mutex<u32>,
        closed: Mutex<bool>,
    }

    impl MockPublisher {
        /// Create an empty publisher.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the next `times` sends.
        pub fn fail_next(&self, times: u32) {
            *self.failures.lock() = times;
        }

        /// Records acknowledged so far.
        #[must_use]
        pub fn sent(&self) -> Vec<SentRecord> {
            self.sent.lock().clone()
        }

        /// Whether `close` was called.
        #[must_use]
        pub fn is_closed(&self) -> bool {
            *self.closed.lock()
        }
    }

    #[async_trait]
    impl RecordPublisher for MockPublisher {
        async fn send(&self, topic: &str, key: i64, record: &StatusRecord) -> Result<Delivery> {
            {
                let mut failures = self.failures.lock();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(KafkaError::Delivery {
                        topic: topic.to_string(),
                        reason: "Message timed out".to_string(),
                    });
                }
            }

            let mut sent = self.sent.lock();
            sent.push(SentRecord {
                topic: topic.to_string(),
                key,
                record: record.clone(),
            });
            Ok(Delivery {
                topic: topic.to_string(),
                partition: 0,
                offset: i64::try_from(sent.len() - 1).unwrap_or(i64::MAX),
            })
        }

        async fn close(&self) -> Result<()> {
            *self.closed.lock() = true;
            Ok(())
        }
    }
}
