//! Topic readiness: request creation, then wait for the listing to catch up.

use std::collections::HashSet;
use std::sync::Arc;

use status_relay_core::TopicSpec;
use tracing::{debug, info, warn};

use crate::admin::AdminPort;
use crate::error::{Phase, ReadinessError, Result};
use crate::policy::{RetryPolicy, Sleeper};

/// Successful completion of a readiness loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ready {
    /// Probes issued, including the successful one.
    pub probes: u32,
}

/// Ensures every target topic exists on the cluster.
pub struct TopicReadinessChecker {
    admin: Arc<dyn AdminPort>,
    verify_policy: RetryPolicy,
    request_policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for TopicReadinessChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicReadinessChecker")
            .field("verify_policy", &self.verify_policy)
            .field("request_policy", &self.request_policy)
            .finish_non_exhaustive()
    }
}

impl TopicReadinessChecker {
    /// Create a new checker.
    ///
    /// `request_policy` bounds the creation request; `verify_policy` bounds
    /// the listing loop.
    pub fn new(
        admin: Arc<dyn AdminPort>,
        verify_policy: RetryPolicy,
        request_policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            admin,
            verify_policy,
            request_policy,
            sleeper,
        }
    }

    /// Make sure every topic in `specs` exists.
    ///
    /// Submits one creation request for the whole set (retried only if the
    /// request itself fails), then polls the cluster listing until every
    /// name is present. Topics that already exist are not an error, so
    /// repeating the call on a ready cluster is harmless.
    ///
    /// # Errors
    ///
    /// - [`ReadinessError::CreationRequestFailure`] if every creation request failed
    /// - [`ReadinessError::RetryBudgetExhausted`] if the topics never showed up
    pub async fn ensure(&self, specs: &[TopicSpec]) -> Result<Ready> {
        self.request_creation(specs).await?;
        self.verify(specs).await
    }

    async fn request_creation(&self, specs: &[TopicSpec]) -> Result<()> {
        let mut backoff = self.request_policy.backoff();
        info!(topics = specs.len(), "Requesting topic creation");

        loop {
            match self.admin.create_topics(specs).await {
                Ok(outcome) => {
                    for (name, reason) in outcome.rejected() {
                        warn!(topic = %name, reason = %reason, "Topic creation rejected");
                    }
                    debug!(created = outcome.created_count(), "Topic creation request accepted");
                    return Ok(());
                }
                Err(err) => {
                    let attempt = backoff.attempt();
                    let Some(delay) = backoff.next_delay() else {
                        return Err(ReadinessError::CreationRequestFailure {
                            attempts: attempt,
                            source: err,
                        });
                    };
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "Topic creation request failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    async fn verify(&self, specs: &[TopicSpec]) -> Result<Ready> {
        let mut backoff = self.verify_policy.backoff();

        loop {
            let attempt = backoff.attempt();
            let missing = match self.admin.list_topics().await {
                Ok(listing) => missing_topics(specs, listing.iter().map(|t| t.name.as_str())),
                Err(err) => {
                    debug!(attempt, error = %err, "Topic listing failed");
                    specs.iter().map(|spec| spec.name.clone()).collect()
                }
            };

            if missing.is_empty() {
                info!(probes = attempt, "All topics present");
                return Ok(Ready { probes: attempt });
            }

            let Some(delay) = backoff.next_delay() else {
                warn!(attempts = attempt, missing = ?missing, "Topics never became visible");
                return Err(ReadinessError::RetryBudgetExhausted {
                    phase: Phase::TopicVerification,
                    attempts: attempt,
                });
            };
            debug!(
                attempt,
                delay_ms = delay.as_millis(),
                missing = ?missing,
                "Topics not yet visible, backing off"
            );
            self.sleeper.sleep(delay).await;
        }
    }
}

/// Names in `specs` absent from one listing snapshot, in spec order.
fn missing_topics<'a>(specs: &[TopicSpec], listed: impl Iterator<Item = &'a str>) -> Vec<String> {
    let listed: HashSet<&str> = listed.collect();
    specs
        .iter()
        .filter(|spec| !listed.contains(spec.name.as_str()))
        .map(|spec| spec.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::admin::mock::MockAdmin;
    use crate::error::PortError;
    use crate::policy::mock::RecordingSleeper;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn checker(
        admin: &Arc<MockAdmin>,
        sleeper: &Arc<RecordingSleeper>,
        max_attempts: u32,
    ) -> TopicReadinessChecker {
        let verify = RetryPolicy::new(max_attempts, 2.0, ms(100)).unwrap();
        let request = RetryPolicy::new(max_attempts, 2.0, ms(50))
            .unwrap()
            .with_max_sleep(ms(80));
        TopicReadinessChecker::new(admin.clone(), verify, request, sleeper.clone())
    }

    fn specs(names: &[&str]) -> Vec<TopicSpec> {
        names.iter().map(|n| TopicSpec::new(n, 3, 3)).collect()
    }

    #[tokio::test]
    async fn topic_visible_on_second_listing() {
        let admin = Arc::new(MockAdmin::new());
        admin.push_names(&[]);
        let sleeper = Arc::new(RecordingSleeper::new());

        let ready = checker(&admin, &sleeper, 3)
            .ensure(&specs(&["twitter-topic"]))
            .await
            .unwrap();

        assert_eq!(ready.probes, 2);
        assert_eq!(sleeper.sleeps(), vec![ms(100)]);
        assert_eq!(admin.create_calls().len(), 1);
    }

    #[tokio::test]
    async fn never_visible_exhausts_budget() {
        let admin = Arc::new(MockAdmin::new());
        admin.set_materialize(false);
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = checker(&admin, &sleeper, 3)
            .ensure(&specs(&["twitter-topic"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReadinessError::RetryBudgetExhausted {
                phase: Phase::TopicVerification,
                attempts: 3
            }
        ));
        assert_eq!(admin.list_calls(), 3);
        assert_eq!(sleeper.sleeps(), vec![ms(100), ms(200)]);
        assert_eq!(sleeper.total(), ms(300));
    }

    #[tokio::test]
    async fn every_topic_must_appear_in_the_same_snapshot() {
        let admin = Arc::new(MockAdmin::new());
        admin.push_names(&["a"]);
        admin.push_names(&["b"]);
        let sleeper = Arc::new(RecordingSleeper::new());

        let ready = checker(&admin, &sleeper, 5)
            .ensure(&specs(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(ready.probes, 3);
        assert_eq!(sleeper.sleeps(), vec![ms(100), ms(200)]);
    }

    #[tokio::test]
    async fn failed_or_empty_listing_counts_as_miss() {
        let admin = Arc::new(MockAdmin::new());
        admin.push_listing(Err(PortError::AdminUnavailable("timeout".into())));
        admin.push_names(&[]);
        let sleeper = Arc::new(RecordingSleeper::new());

        let ready = checker(&admin, &sleeper, 3)
            .ensure(&specs(&["twitter-topic"]))
            .await
            .unwrap();

        assert_eq!(ready.probes, 3);
        assert_eq!(admin.list_calls(), 3);
    }

    #[tokio::test]
    async fn single_attempt_never_sleeps() {
        let admin = Arc::new(MockAdmin::new());
        admin.set_materialize(false);
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = checker(&admin, &sleeper, 1)
            .ensure(&specs(&["t"]))
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), 1);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn existing_topics_are_tolerated_and_call_is_idempotent() {
        let admin = Arc::new(MockAdmin::with_topics(["a", "b"]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let checker = checker(&admin, &sleeper, 3);

        let first = checker.ensure(&specs(&["a", "b"])).await.unwrap();
        let second = checker.ensure(&specs(&["a", "b"])).await.unwrap();

        assert_eq!(first.probes, 1);
        assert_eq!(second.probes, 1);
        assert_eq!(admin.create_calls().len(), 2);
        assert_eq!(admin.topic_names(), vec!["a", "b"]);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn creation_request_is_retried_with_capped_backoff() {
        let admin = Arc::new(MockAdmin::new());
        admin.fail_creation(2);
        let sleeper = Arc::new(RecordingSleeper::new());

        let ready = checker(&admin, &sleeper, 3)
            .ensure(&specs(&["t"]))
            .await
            .unwrap();

        assert_eq!(ready.probes, 1);
        assert_eq!(admin.create_calls().len(), 3);
        assert_eq!(sleeper.sleeps(), vec![ms(50), ms(80)]);
    }

    #[tokio::test]
    async fn creation_request_failure_is_fatal() {
        let admin = Arc::new(MockAdmin::new());
        admin.fail_creation(10);
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = checker(&admin, &sleeper, 2)
            .ensure(&specs(&["t"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReadinessError::CreationRequestFailure { attempts: 2, .. }
        ));
        assert_eq!(admin.list_calls(), 0);
    }

    #[test]
    fn missing_preserves_spec_order() {
        let missing = missing_topics(&specs(&["c", "a", "b"]), ["a"].into_iter());
        assert_eq!(missing, vec!["c", "b"]);
    }
}
