//! Error types for the readiness crate.

use std::fmt;

use thiserror::Error;

/// Failures reported by a port call.
///
/// Inside the readiness loops these are downgraded to a miss; they only
/// surface to the caller when wrapped in [`ReadinessError::CreationRequestFailure`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    /// The broker admin interface could not complete the call.
    #[error("admin interface unavailable: {0}")]
    AdminUnavailable(String),

    /// The schema registry could not be reached.
    #[error("schema registry unreachable: {0}")]
    Unreachable(String),
}

/// The readiness phase a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Submitting the topic creation request.
    TopicCreation,
    /// Waiting for topics to appear in the cluster listing.
    TopicVerification,
    /// Waiting for the schema registry to answer.
    SchemaRegistry,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TopicCreation => "topic creation",
            Self::TopicVerification => "topic verification",
            Self::SchemaRegistry => "schema registry check",
        };
        f.write_str(name)
    }
}

/// Fatal readiness failures. These abort startup.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// A polling loop missed on every one of its attempts.
    #[error("reached max number of retries ({attempts}) during {phase}")]
    RetryBudgetExhausted {
        /// The loop that gave up.
        phase: Phase,
        /// Number of probes issued.
        attempts: u32,
    },

    /// The topic creation request itself failed on every attempt.
    #[error("topic creation request failed after {attempts} attempt(s): {source}")]
    CreationRequestFailure {
        /// Number of creation requests issued.
        attempts: u32,
        /// The last port failure.
        #[source]
        source: PortError,
    },
}

impl ReadinessError {
    /// The phase that failed.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::RetryBudgetExhausted { phase, .. } => *phase,
            Self::CreationRequestFailure { .. } => Phase::TopicCreation,
        }
    }

    /// Number of attempts made before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::RetryBudgetExhausted { attempts, .. }
            | Self::CreationRequestFailure { attempts, .. } => *attempts,
        }
    }
}

/// A specialized Result type for readiness operations.
pub type Result<T> = std::result::Result<T, ReadinessError>;
