//! Readiness orchestration.
//!
//! Topics are checked first since the producer needs them immediately; the
//! registry is checked second, still before the stream starts. The first
//! failure short-circuits the sequence.

use std::sync::Arc;

use status_relay_core::{RetryConfig, TopicSpec};
use tracing::info;

use crate::admin::AdminPort;
use crate::error::Result;
use crate::policy::{RetryPolicy, Sleeper};
use crate::registry::RegistryHealthPort;
use crate::registry_check::RegistryReadinessChecker;
use crate::topic_check::TopicReadinessChecker;

/// Probe counts of a successful readiness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Listing probes issued by the topic checker.
    pub topic_probes: u32,
    /// Health probes issued by the registry checker.
    pub registry_probes: u32,
}

/// Gates startup on topic existence and schema registry liveness.
#[derive(Debug)]
pub struct ReadinessOrchestrator {
    topics: Vec<TopicSpec>,
    topic_checker: TopicReadinessChecker,
    registry_checker: RegistryReadinessChecker,
}

impl ReadinessOrchestrator {
    /// Create an orchestrator from prepared checkers.
    ///
    /// The topic set is fixed for the lifetime of the orchestrator.
    #[must_use]
    pub fn new(
        topics: Vec<TopicSpec>,
        topic_checker: TopicReadinessChecker,
        registry_checker: RegistryReadinessChecker,
    ) -> Self {
        Self {
            topics,
            topic_checker,
            registry_checker,
        }
    }

    /// Build an orchestrator from configuration.
    ///
    /// Topic verification and registry polling share the verification
    /// policy; the creation request uses the capped request policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic set or the retry configuration is invalid.
    pub fn from_config(
        topics: Vec<TopicSpec>,
        admin: Arc<dyn AdminPort>,
        registry: Arc<dyn RegistryHealthPort>,
        retry: &RetryConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> status_relay_core::Result<Self> {
        status_relay_core::topic::validate_topic_set(&topics)?;
        retry.validate()?;

        let verify_policy = RetryPolicy::verification(retry)?;
        let request_policy = RetryPolicy::creation_request(retry)?;

        let topic_checker = TopicReadinessChecker::new(
            admin,
            verify_policy.clone(),
            request_policy,
            Arc::clone(&sleeper),
        );
        let registry_checker = RegistryReadinessChecker::new(registry, verify_policy, sleeper);

        Ok(Self::new(topics, topic_checker, registry_checker))
    }

    /// The topics this orchestrator ensures.
    #[must_use]
    pub fn topics(&self) -> &[TopicSpec] {
        &self.topics
    }

    /// Ensure every topic exists, then that the schema registry is up.
    ///
    /// The registry is never probed if the topic phase fails.
    ///
    /// # Errors
    ///
    /// Returns the first phase failure.
    pub async fn ensure_ready(&self) -> Result<ReadinessReport> {
        let topics = self.topic_checker.ensure(&self.topics).await?;
        let registry = self.registry_checker.ensure().await?;

        let report = ReadinessReport {
            topic_probes: topics.probes,
            registry_probes: registry.probes,
        };
        info!(
            topic_probes = report.topic_probes,
            registry_probes = report.registry_probes,
            "Cluster ready"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::admin::mock::MockAdmin;
    use crate::error::{Phase, ReadinessError};
    use crate::policy::mock::RecordingSleeper;
    use crate::registry::mock::MockRegistry;

    fn retry() -> RetryConfig {
        RetryConfig {
            initial_interval_ms: 10,
            max_interval_ms: 40,
            multiplier: 2.0,
            max_attempts: 3,
            sleep_time_ms: 100,
        }
    }

    fn orchestrator(
        admin: &Arc<MockAdmin>,
        registry: &Arc<MockRegistry>,
        sleeper: &Arc<RecordingSleeper>,
    ) -> ReadinessOrchestrator {
        ReadinessOrchestrator::from_config(
            vec![TopicSpec::new("twitter-topic", 3, 3)],
            admin.clone(),
            registry.clone(),
            &retry(),
            sleeper.clone(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn registry_never_probed_when_topics_fail() {
        let admin = Arc::new(MockAdmin::new());
        admin.set_materialize(false);
        let registry = Arc::new(MockRegistry::new());
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = orchestrator(&admin, &registry, &sleeper)
            .ensure_ready()
            .await
            .unwrap_err();

        assert_eq!(err.phase(), Phase::TopicVerification);
        assert_eq!(registry.probe_calls(), 0);
    }

    #[tokio::test]
    async fn registry_failure_propagates_with_phase() {
        let admin = Arc::new(MockAdmin::new());
        let registry = Arc::new(MockRegistry::always(503));
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = orchestrator(&admin, &registry, &sleeper)
            .ensure_ready()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReadinessError::RetryBudgetExhausted {
                phase: Phase::SchemaRegistry,
                attempts: 3
            }
        ));
        assert_eq!(registry.probe_calls(), 3);
    }

    #[tokio::test]
    async fn reports_probe_counts() {
        let admin = Arc::new(MockAdmin::new());
        admin.push_names(&[]);
        let registry = Arc::new(MockRegistry::new());
        registry.push_status(502);
        let sleeper = Arc::new(RecordingSleeper::new());

        let report = orchestrator(&admin, &registry, &sleeper)
            .ensure_ready()
            .await
            .unwrap();

        assert_eq!(
            report,
            ReadinessReport {
                topic_probes: 2,
                registry_probes: 2
            }
        );
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_millis(100), Duration::from_millis(100)]
        );
    }

    #[tokio::test]
    async fn creation_failure_skips_verification_and_registry() {
        let admin = Arc::new(MockAdmin::new());
        admin.fail_creation(u32::MAX);
        let registry = Arc::new(MockRegistry::new());
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = orchestrator(&admin, &registry, &sleeper)
            .ensure_ready()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReadinessError::CreationRequestFailure { attempts: 3, .. }
        ));
        assert_eq!(admin.create_calls().len(), 3);
        assert_eq!(admin.list_calls(), 0);
        assert_eq!(registry.probe_calls(), 0);
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }

    #[test]
    fn rejects_empty_topic_set() {
        let result = ReadinessOrchestrator::from_config(
            Vec::new(),
            Arc::new(MockAdmin::new()),
            Arc::new(MockRegistry::new()),
            &retry(),
            Arc::new(RecordingSleeper::new()),
        );
        assert!(result.is_err());
    }
}
