//! Startup gate run before the stream starts.

use status_relay_readiness::{ReadinessOrchestrator, ReadinessReport};
use tracing::{error, info};

use crate::error::Result;
use crate::state::ReadinessHandle;

/// Runs the readiness orchestrator and records its outcome.
#[derive(Debug)]
pub struct StreamInitializer {
    orchestrator: ReadinessOrchestrator,
    readiness: ReadinessHandle,
}

impl StreamInitializer {
    /// Create an initializer reporting into `readiness`.
    #[must_use]
    pub fn new(orchestrator: ReadinessOrchestrator, readiness: ReadinessHandle) -> Self {
        Self {
            orchestrator,
            readiness,
        }
    }

    /// Handle to the recorded outcome.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessHandle {
        &self.readiness
    }

    /// Wait until every topic exists and the schema registry answers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ServiceError::Readiness`] if the cluster never became
    /// ready. The stream must not be started in that case.
    pub async fn init(&self) -> Result<ReadinessReport> {
        match self.orchestrator.ensure_ready().await {
            Ok(report) => {
                let names: Vec<&str> = self
                    .orchestrator
                    .topics()
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect();
                info!(topics = ?names, "Topics are ready for operations");
                self.readiness.set_ready();
                Ok(report)
            }
            Err(e) => {
                error!(
                    phase = %e.phase(),
                    attempts = e.attempts(),
                    error = %e,
                    "Cluster readiness failed"
                );
                self.readiness.set_failed(e.to_string());
                Err(e.into())
            }
        }
    }
}
