//! Cluster readiness orchestration for status-relay.
//!
//! Before the relay publishes anything, the broker topics it writes to must
//! exist and the schema registry must answer. This crate provides the
//! [`ReadinessOrchestrator`] that gates startup on both, under a bounded
//! exponential backoff:
//!
//! - Topic creation is requested once (with its own retry budget) and then
//!   verified against the live topic listing
//! - The schema registry is probed until it returns a 2xx status
//! - Every loop issues at most `max_attempts` probes before failing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Stream Initializer                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ ensure_ready()
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ReadinessOrchestrator                      │
//! │  ┌───────────────────────┐   ┌───────────────────────────┐ │
//! │  │ TopicReadinessChecker │──▶│ RegistryReadinessChecker  │ │
//! │  │  create → verify      │   │  probe until 2xx          │ │
//! │  └───────────────────────┘   └───────────────────────────┘ │
//! │                 RetryPolicy / BackoffState                   │
//! └─────────────────────────────────────────────────────────────┘
//!               │                              │
//!               ▼                              ▼
//!        ┌─────────────┐                ┌──────────────┐
//!        │  AdminPort  │                │ RegistryHealth│
//!        │  (broker)   │                │ Port (HTTP)  │
//!        └─────────────┘                └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use status_relay_readiness::{
//!     MockAdmin, MockRegistry, ReadinessOrchestrator, RecordingSleeper,
//! };
//! use status_relay_core::RelayConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelayConfig::default();
//! let orchestrator = ReadinessOrchestrator::from_config(
//!     config.kafka.topic_specs(),
//!     Arc::new(MockAdmin::new()),
//!     Arc::new(MockRegistry::new()),
//!     &config.retry,
//!     Arc::new(RecordingSleeper::new()),
//! )?;
//!
//! let report = orchestrator.ensure_ready().await?;
//! assert_eq!(report.topic_probes, 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod admin;
pub mod error;
pub mod orchestrator;
pub mod policy;
pub mod registry;
pub mod registry_check;
pub mod topic_check;

pub use admin::{AdminPort, CreationOutcome, TopicCreationStatus, TopicListing};
pub use error::{Phase, PortError, ReadinessError, Result};
pub use orchestrator::{ReadinessOrchestrator, ReadinessReport};
pub use policy::{BackoffState, RetryPolicy, Sleeper, TokioSleeper};
pub use registry::{HttpRegistryHealth, ProbeStatus, RegistryHealthPort};
pub use registry_check::RegistryReadinessChecker;
pub use topic_check::{Ready, TopicReadinessChecker};

#[cfg(any(test, feature = "test-utils"))]
pub use admin::mock::MockAdmin;
#[cfg(any(test, feature = "test-utils"))]
pub use policy::mock::RecordingSleeper;
#[cfg(any(test, feature = "test-utils"))]
pub use registry::mock::MockRegistry;
