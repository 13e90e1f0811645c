//! Shared readiness state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Outcome of the startup readiness gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReadinessState {
    /// The gate has not finished yet.
    #[default]
    Pending,
    /// Every topic exists and the schema registry answered.
    Ready,
    /// The gate gave up.
    Failed(String),
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Ready => f.write_str("ready"),
            Self::Failed(_) => f.write_str("failed"),
        }
    }
}

/// Cloneable handle to the readiness state, shared with the HTTP handlers.
#[derive(Debug, Clone, Default)]
pub struct ReadinessHandle {
    inner: Arc<RwLock<ReadinessState>>,
}

impl ReadinessHandle {
    /// Create a handle in the pending state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> ReadinessState {
        self.inner.read().clone()
    }

    /// Whether the gate succeeded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.inner.read() == ReadinessState::Ready
    }

    /// Mark the gate as passed.
    pub fn set_ready(&self) {
        *self.inner.write() = ReadinessState::Ready;
    }

    /// Mark the gate as failed.
    pub fn set_failed(&self, reason: impl Into<String>) {
        *self.inner.write() = ReadinessState::Failed(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let handle = ReadinessHandle::new();
        let observer = handle.clone();
        assert_eq!(observer.current(), ReadinessState::Pending);

        handle.set_failed("registry down");
        assert_eq!(
            observer.current(),
            ReadinessState::Failed("registry down".into())
        );

        handle.set_ready();
        assert!(observer.is_ready());
    }
}
