//! Status stream runners.
//!
//! A runner feeds statuses to a [`StatusListener`] until cancelled. The
//! simulated runner produces raw JSON and decodes it through [`Status`], so
//! it exercises the same decode path a live stream would.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use status_relay_core::status::STATUS_DATE_FORMAT;
use status_relay_core::{Status, StreamConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::listener::StatusListener;

/// Vocabulary of the simulated stream.
const WORDS: &[&str] = &[
    "Neque",
    "porro",
    "quisquam",
    "est",
    "qui",
    "dolorem",
    "ipsum",
    "quia",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipisci",
    "velit...",
    "Lorem",
    "ipsum",
    "dolor",
];

/// A source of statuses.
#[async_trait]
pub trait StreamRunner: Send + Sync {
    /// Deliver statuses to the listener until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot continue.
    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

/// Emits a random status every `sleep_ms`.
pub struct MockStreamRunner {
    listener: Arc<StatusListener>,
    config: StreamConfig,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for MockStreamRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStreamRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MockStreamRunner {
    /// Create a runner seeded from system entropy.
    #[must_use]
    pub fn new(listener: Arc<StatusListener>, config: StreamConfig) -> Self {
        Self::with_rng(listener, config, StdRng::from_entropy())
    }

    /// Create a runner with a fixed seed.
    #[must_use]
    pub fn with_seed(listener: Arc<StatusListener>, config: StreamConfig, seed: u64) -> Self {
        Self::with_rng(listener, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(listener: Arc<StatusListener>, config: StreamConfig, rng: StdRng) -> Self {
        Self {
            listener,
            config,
            rng: Mutex::new(rng),
        }
    }

    fn next_raw_status(&self) -> String {
        let mut rng = self.rng.lock();
        raw_status(&mut *rng, &self.config)
    }
}

#[async_trait]
impl StreamRunner for MockStreamRunner {
    async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(
            keywords = ?self.config.keywords,
            topic = %self.listener.topic(),
            "Started filtering status stream for keywords"
        );
        let sleep = self.config.sleep();

        while !shutdown.is_cancelled() {
            let raw = self.next_raw_status();
            match Status::from_json(&raw) {
                Ok(status) => {
                    self.listener.on_status(&status).await;
                }
                Err(e) => warn!(error = %e, raw = %raw, "Skipping malformed status"),
            }

            if wait(&shutdown, sleep).await {
                break;
            }
        }

        debug!("Status stream stopped");
        Ok(())
    }
}

/// Sleep for `duration` unless cancelled first. Returns whether cancelled.
async fn wait(shutdown: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        () = shutdown.cancelled() => true,
        () = tokio::time::sleep(duration) => false,
    }
}

/// Build one raw status in the stream's JSON shape.
fn raw_status<R: Rng + ?Sized>(rng: &mut R, config: &StreamConfig) -> String {
    serde_json::json!({
        "created_at": Utc::now().format(STATUS_DATE_FORMAT).to_string(),
        "id": rng.gen_range(1..=i64::MAX).to_string(),
        "text": random_text(rng, &config.keywords, config.min_length, config.max_length),
        "user": { "id": rng.gen_range(1..=i64::MAX).to_string() },
    })
    .to_string()
}

/// `min..=max` random words with one keyword after the middle word.
fn random_text<R: Rng + ?Sized>(
    rng: &mut R,
    keywords: &[String],
    min_length: usize,
    max_length: usize,
) -> String {
    let length = rng.gen_range(min_length..=max_length.max(min_length));
    let mut words = Vec::with_capacity(length + 1);
    for i in 0..length {
        words.push(WORDS[rng.gen_range(0..WORDS.len())]);
        if i == length / 2 && !keywords.is_empty() {
            words.push(keywords[rng.gen_range(0..keywords.len())].as_str());
        }
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use status_relay_kafka::MockPublisher;

    fn config() -> StreamConfig {
        StreamConfig {
            keywords: vec!["Kafka".to_string()],
            welcome_message: "hi".to_string(),
            min_length: 5,
            max_length: 15,
            sleep_ms: 1,
        }
    }

    #[test]
    fn text_contains_one_keyword_after_the_middle_word() {
        let mut rng = StdRng::seed_from_u64(7);
        let keywords = vec!["Kafka".to_string()];
        for _ in 0..50 {
            let text = random_text(&mut rng, &keywords, 5, 15);
            let words: Vec<_> = text.split(' ').collect();
            let length = words.len() - 1;
            assert!((5..=15).contains(&length), "{text}");
            assert_eq!(words[length / 2 + 1], "Kafka", "{text}");
            assert_eq!(words.iter().filter(|w| **w == "Kafka").count(), 1);
        }
    }

    #[test]
    fn raw_status_decodes() {
        let mut rng = StdRng::seed_from_u64(1);
        let raw = raw_status(&mut rng, &config());
        let status = Status::from_json(&raw).unwrap();
        assert!(status.id > 0);
        assert!(status.user.id > 0);
        assert!(status.text.contains("Kafka"));
    }

    #[tokio::test]
    async fn runner_publishes_until_cancelled() {
        let publisher = Arc::new(MockPublisher::new());
        let listener = Arc::new(StatusListener::new("twitter-topic", publisher.clone()));
        let runner = Arc::new(MockStreamRunner::with_seed(listener, config(), 3));
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn({
            let runner = Arc::clone(&runner);
            let shutdown = shutdown.clone();
            async move { runner.run(shutdown).await }
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while publisher.sent().len() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let sent = publisher.sent();
        assert!(sent.iter().all(|s| s.topic == "twitter-topic"));
        assert!(sent.iter().all(|s| s.key == s.record.user_id));
    }

    #[tokio::test]
    async fn cancelled_runner_emits_nothing() {
        let publisher = Arc::new(MockPublisher::new());
        let listener = Arc::new(StatusListener::new("t", publisher.clone()));
        let runner = MockStreamRunner::new(listener, config());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        runner.run(shutdown).await.unwrap();
        assert!(publisher.sent().is_empty());
    }
}
