//! Schema registry readiness loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Phase, ReadinessError, Result};
use crate::policy::{RetryPolicy, Sleeper};
use crate::registry::RegistryHealthPort;
use crate::topic_check::Ready;

/// Polls the schema registry until it answers with a 2xx status.
pub struct RegistryReadinessChecker {
    port: Arc<dyn RegistryHealthPort>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RegistryReadinessChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryReadinessChecker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RegistryReadinessChecker {
    /// Create a new checker.
    pub fn new(
        port: Arc<dyn RegistryHealthPort>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            port,
            policy,
            sleeper,
        }
    }

    /// Probe until the registry is healthy or the retry budget is spent.
    ///
    /// A non-2xx response and a transport fault both count as one miss.
    ///
    /// # Errors
    ///
    /// Returns [`ReadinessError::RetryBudgetExhausted`] if every probe missed.
    pub async fn ensure(&self) -> Result<Ready> {
        let mut backoff = self.policy.backoff();

        loop {
            let attempt = backoff.attempt();
            match self.port.probe().await {
                Ok(status) if status.is_success() => {
                    info!(probes = attempt, "Schema registry is up");
                    return Ok(Ready { probes: attempt });
                }
                Ok(status) => debug!(attempt, %status, "Schema registry not ready"),
                Err(err) => debug!(attempt, error = %err, "Schema registry probe failed"),
            }

            let Some(delay) = backoff.next_delay() else {
                warn!(attempts = attempt, "Schema registry never became ready");
                return Err(ReadinessError::RetryBudgetExhausted {
                    phase: Phase::SchemaRegistry,
                    attempts: attempt,
                });
            };
            self.sleeper.sleep(delay).await;
        }
    }
}
