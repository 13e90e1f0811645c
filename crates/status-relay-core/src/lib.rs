//! Core types and utilities for status-relay.
//!
//! This crate provides the foundational types used throughout the relay:
//!
//! - **Configuration**: broker, retry, and stream settings bound once at startup
//! - **Topics**: the immutable [`TopicSpec`] describing a topic to create
//! - **Records**: the incoming [`Status`] and the published [`StatusRecord`]
//! - **Error types**: configuration errors shared across crates
//!
//! # Example
//!
//! ```
//! use status_relay_core::{RelayConfig, TopicSpec};
//!
//! let config = RelayConfig::default();
//! config.validate().unwrap();
//!
//! let topics: Vec<TopicSpec> = config.kafka.topic_specs();
//! assert_eq!(topics[0].name, "twitter-topic");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod status;
pub mod topic;

pub use config::{KafkaConfig, RelayConfig, RetryConfig, StreamConfig};
pub use error::{CoreError, Result};
pub use status::{Status, StatusRecord, StatusUser};
pub use topic::TopicSpec;
