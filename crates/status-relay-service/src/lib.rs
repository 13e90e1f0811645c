//! Status relay service.
//!
//! Wires the readiness gate, the status stream and the Kafka publisher into
//! one process:
//!
//! 1. [`init::StreamInitializer`] blocks ingestion until every topic exists
//!    and the schema registry answers
//! 2. [`stream::StreamRunner`] feeds statuses to the [`listener::StatusListener`]
//! 3. The listener transforms each status and publishes it keyed by author id
//!
//! The HTTP surface in [`routes`] exposes liveness and the readiness outcome.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod error;
pub mod init;
pub mod listener;
pub mod routes;
pub mod state;
pub mod stream;
pub mod transform;

pub use app::App;
pub use error::{Result, ServiceError};
pub use init::StreamInitializer;
pub use listener::StatusListener;
pub use state::{ReadinessHandle, ReadinessState};
pub use stream::{MockStreamRunner, StreamRunner};
pub use transform::StatusTransformer;
