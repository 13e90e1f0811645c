//! Kafka adapters for status-relay.
//!
//! This crate connects the relay to a live broker:
//!
//! - [`KafkaAdminClient`] implements the readiness [`AdminPort`](status_relay_readiness::AdminPort)
//!   on top of the rdkafka admin API
//! - [`codec`] encodes [`StatusRecord`](status_relay_core::StatusRecord)s as Avro datums
//! - [`KafkaRecordPublisher`] sends encoded records through an rdkafka `FutureProducer`
//!
//! # Example
//!
//! ```ignore
//! use status_relay_core::{KafkaConfig, StatusRecord};
//! use status_relay_kafka::{KafkaRecordPublisher, RecordPublisher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = KafkaConfig::default();
//! let publisher = KafkaRecordPublisher::new(&config)?;
//!
//! let record = StatusRecord { user_id: 42, id: 1, text: "hello".into(), created_at: 0 };
//! let delivery = publisher.send(&config.topic_name, record.user_id, &record).await?;
//! println!("stored at {}:{}", delivery.partition, delivery.offset);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod admin;
pub mod codec;
pub mod error;
pub mod publisher;

pub use admin::KafkaAdminClient;
pub use error::{KafkaError, Result};
pub use publisher::{Delivery, KafkaRecordPublisher, RecordPublisher};

#[cfg(any(test, feature = "test-utils"))]
pub use publisher::mock::MockPublisher;
