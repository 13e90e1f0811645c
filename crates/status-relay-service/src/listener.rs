//! Status listener: transform and publish every status the stream delivers.

use std::sync::Arc;

use status_relay_core::Status;
use status_relay_kafka::{Delivery, RecordPublisher};
use tracing::{debug, error, info, warn};

use crate::transform::StatusTransformer;

/// Publishes each received status to the configured topic.
pub struct StatusListener {
    topic: String,
    publisher: Arc<dyn RecordPublisher>,
    transformer: StatusTransformer,
}

impl std::fmt::Debug for StatusListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusListener")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl StatusListener {
    /// Create a listener publishing to `topic`.
    pub fn new(topic: impl Into<String>, publisher: Arc<dyn RecordPublisher>) -> Self {
        Self {
            topic: topic.into(),
            publisher,
            transformer: StatusTransformer,
        }
    }

    /// Topic records are published to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Handle one status.
    ///
    /// Publish failures are logged and swallowed so the stream keeps going.
    /// Returns the acknowledgement when the record was stored.
    pub async fn on_status(&self, status: &Status) -> Option<Delivery> {
        info!(
            text = %status.text,
            topic = %self.topic,
            "Received status, sending to Kafka"
        );
        let record = self.transformer.to_record(status);

        match self.publisher.send(&self.topic, record.user_id, &record).await {
            Ok(delivery) => {
                debug!(
                    topic = %delivery.topic,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "Record acknowledged"
                );
                Some(delivery)
            }
            Err(e) if e.is_retriable() => {
                warn!(
                    topic = %self.topic,
                    status_id = record.id,
                    error = %e,
                    "Status not delivered, dropping it"
                );
                None
            }
            Err(e) => {
                error!(
                    topic = %self.topic,
                    status_id = record.id,
                    error = %e,
                    "Failed to publish status"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use status_relay_kafka::MockPublisher;

    fn status(user_id: i64) -> Status {
        Status::from_json(&format!(
            r#"{{"created_at":"Mon Oct 19 12:30:00 +0000 2026","id":1,"text":"Kafka","user":{{"id":{user_id}}}}}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn publishes_keyed_by_author() {
        let publisher = Arc::new(MockPublisher::new());
        let listener = StatusListener::new("twitter-topic", publisher.clone());
        assert_eq!(listener.topic(), "twitter-topic");

        let delivery = listener.on_status(&status(77)).await.unwrap();

        assert_eq!(delivery.topic, "twitter-topic");
        let sent = publisher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].key, 77);
        assert_eq!(sent[0].record.user_id, 77);
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let publisher = Arc::new(MockPublisher::new());
        publisher.fail_next(1);
        let listener = StatusListener::new("twitter-topic", publisher.clone());

        assert!(listener.on_status(&status(1)).await.is_none());
        assert!(listener.on_status(&status(2)).await.is_some());
        assert_eq!(publisher.sent().len(), 1);
    }
}
