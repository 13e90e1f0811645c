//! Relay configuration types.
//!
//! Configuration is read once at startup, validated, and treated as immutable
//! for the rest of the process lifetime.

use std::time::Duration;

use crate::error::{CoreError, Result};
use crate::topic::{validate_topic_set, TopicSpec};

/// Top-level configuration for the relay service.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// HTTP listen address for the health endpoints.
    pub listen_addr: String,
    /// Broker and schema registry settings.
    pub kafka: KafkaConfig,
    /// Retry and backoff settings.
    pub retry: RetryConfig,
    /// Status stream settings.
    pub stream: StreamConfig,
}

impl RelayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    /// Load configuration from environment variables.
    ///
    /// See [`KafkaConfig::from_lookup`], [`RetryConfig::from_lookup`] and
    /// [`StreamConfig::from_lookup`] for the variables each section reads.
    /// `LISTEN_ADDR` sets the HTTP listen address.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset or unparsable values keep their defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(Self::default_listen_addr),
            kafka: KafkaConfig::from_lookup(&lookup),
            retry: RetryConfig::from_lookup(&lookup),
            stream: StreamConfig::from_lookup(&lookup),
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        self.kafka.validate()?;
        self.retry.validate()?;
        self.stream.validate()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            kafka: KafkaConfig::default(),
            retry: RetryConfig::default(),
            stream: StreamConfig::default(),
        }
    }
}

/// Broker and schema registry settings.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated bootstrap server list.
    pub bootstrap_servers: String,
    /// Schema registry base URL probed for liveness.
    pub schema_registry_url: String,
    /// Topic that records are published to.
    pub topic_name: String,
    /// Topics that must exist before publishing starts.
    pub topic_names_to_create: Vec<String>,
    /// Partition count for created topics.
    pub num_partitions: u32,
    /// Replication factor for created topics.
    pub replication_factor: u32,
    /// Timeout for admin operations and metadata queries, in milliseconds.
    pub admin_timeout_ms: u64,
    /// Timeout for a single publish, in milliseconds.
    pub producer_timeout_ms: u64,
    /// Timeout for a single schema registry probe, in milliseconds.
    pub registry_probe_timeout_ms: u64,
}

impl KafkaConfig {
    fn default_bootstrap_servers() -> String {
        "localhost:19092,localhost:29092,localhost:39092".to_string()
    }

    fn default_schema_registry_url() -> String {
        "http://localhost:8081".to_string()
    }

    fn default_topic_name() -> String {
        "twitter-topic".to_string()
    }

    fn default_topic_names() -> Vec<String> {
        vec![Self::default_topic_name()]
    }

    const fn default_num_partitions() -> u32 {
        3
    }

    const fn default_replication_factor() -> u32 {
        3
    }

    const fn default_timeout_ms() -> u64 {
        5000
    }

    /// Read the section through a key lookup.
    ///
    /// Supported keys:
    /// - `KAFKA_BOOTSTRAP_SERVERS`
    /// - `SCHEMA_REGISTRY_URL`
    /// - `KAFKA_TOPIC_NAME`
    /// - `KAFKA_TOPIC_NAMES_TO_CREATE` (comma-separated)
    /// - `KAFKA_NUM_PARTITIONS`
    /// - `KAFKA_REPLICATION_FACTOR`
    /// - `KAFKA_ADMIN_TIMEOUT_MS`
    /// - `KAFKA_PRODUCER_TIMEOUT_MS`
    /// - `REGISTRY_PROBE_TIMEOUT_MS`
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("KAFKA_BOOTSTRAP_SERVERS") {
            config.bootstrap_servers = val;
        }
        if let Some(val) = lookup("SCHEMA_REGISTRY_URL") {
            config.schema_registry_url = val;
        }
        if let Some(val) = lookup("KAFKA_TOPIC_NAME") {
            config.topic_name = val;
        }
        if let Some(val) = lookup("KAFKA_TOPIC_NAMES_TO_CREATE") {
            config.topic_names_to_create = split_list(&val);
        }
        parse_into(&lookup, "KAFKA_NUM_PARTITIONS", &mut config.num_partitions);
        parse_into(&lookup, "KAFKA_REPLICATION_FACTOR", &mut config.replication_factor);
        parse_into(&lookup, "KAFKA_ADMIN_TIMEOUT_MS", &mut config.admin_timeout_ms);
        parse_into(&lookup, "KAFKA_PRODUCER_TIMEOUT_MS", &mut config.producer_timeout_ms);
        parse_into(
            &lookup,
            "REGISTRY_PROBE_TIMEOUT_MS",
            &mut config.registry_probe_timeout_ms,
        );

        config
    }

    /// Build the target topic set from the configured names.
    #[must_use]
    pub fn topic_specs(&self) -> Vec<TopicSpec> {
        self.topic_names_to_create
            .iter()
            .map(|name| TopicSpec::new(name, self.num_partitions, self.replication_factor))
            .collect()
    }

    /// Admin operation timeout as a `Duration`.
    #[must_use]
    pub fn admin_timeout(&self) -> Duration {
        Duration::from_millis(self.admin_timeout_ms)
    }

    /// Publish timeout as a `Duration`.
    #[must_use]
    pub fn producer_timeout(&self) -> Duration {
        Duration::from_millis(self.producer_timeout_ms)
    }

    /// Registry probe timeout as a `Duration`.
    #[must_use]
    pub fn registry_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.registry_probe_timeout_ms)
    }

    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns an error for blank endpoints or an invalid topic set.
    pub fn validate(&self) -> Result<()> {
        if self.bootstrap_servers.trim().is_empty() {
            return Err(CoreError::invalid_config("bootstrap servers must be set"));
        }
        if self.schema_registry_url.trim().is_empty() {
            return Err(CoreError::invalid_config("schema registry URL must be set"));
        }
        if self.topic_name.trim().is_empty() {
            return Err(CoreError::invalid_config("publish topic name must be set"));
        }
        validate_topic_set(&self.topic_specs())
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: Self::default_bootstrap_servers(),
            schema_registry_url: Self::default_schema_registry_url(),
            topic_name: Self::default_topic_name(),
            topic_names_to_create: Self::default_topic_names(),
            num_partitions: Self::default_num_partitions(),
            replication_factor: Self::default_replication_factor(),
            admin_timeout_ms: Self::default_timeout_ms(),
            producer_timeout_ms: Self::default_timeout_ms(),
            registry_probe_timeout_ms: Self::default_timeout_ms(),
        }
    }
}

/// Retry and backoff settings.
///
/// `sleep_time_ms` seeds the readiness polling loops; `initial_interval_ms`
/// and `max_interval_ms` bound the retries around the topic creation request.
/// Both share `multiplier` and `max_attempts`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// First backoff of the creation request retry, in milliseconds.
    pub initial_interval_ms: u64,
    /// Upper bound of the creation request backoff, in milliseconds.
    pub max_interval_ms: u64,
    /// Backoff multiplier applied after every miss.
    pub multiplier: f64,
    /// Maximum number of attempts per loop.
    pub max_attempts: u32,
    /// First backoff of the readiness polling loops, in milliseconds.
    pub sleep_time_ms: u64,
}

impl RetryConfig {
    const fn default_initial_interval_ms() -> u64 {
        1000
    }

    const fn default_max_interval_ms() -> u64 {
        10_000
    }

    const fn default_multiplier() -> f64 {
        2.0
    }

    const fn default_max_attempts() -> u32 {
        3
    }

    const fn default_sleep_time_ms() -> u64 {
        2000
    }

    /// Read the section through a key lookup.
    ///
    /// Supported keys: `RETRY_INITIAL_INTERVAL_MS`, `RETRY_MAX_INTERVAL_MS`,
    /// `RETRY_MULTIPLIER`, `RETRY_MAX_ATTEMPTS`, `RETRY_SLEEP_TIME_MS`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        parse_into(&lookup, "RETRY_INITIAL_INTERVAL_MS", &mut config.initial_interval_ms);
        parse_into(&lookup, "RETRY_MAX_INTERVAL_MS", &mut config.max_interval_ms);
        parse_into(&lookup, "RETRY_MULTIPLIER", &mut config.multiplier);
        parse_into(&lookup, "RETRY_MAX_ATTEMPTS", &mut config.max_attempts);
        parse_into(&lookup, "RETRY_SLEEP_TIME_MS", &mut config.sleep_time_ms);
        config
    }

    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns an error for zero attempts or a multiplier below one.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(CoreError::invalid_config(
                "retry max attempts must be at least one",
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(CoreError::invalid_config(format!(
                "retry multiplier must be a finite number >= 1, got {}",
                self.multiplier
            )));
        }
        if self.max_interval_ms < self.initial_interval_ms {
            return Err(CoreError::invalid_config(format!(
                "retry max interval {}ms is below the initial interval {}ms",
                self.max_interval_ms, self.initial_interval_ms
            )));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: Self::default_initial_interval_ms(),
            max_interval_ms: Self::default_max_interval_ms(),
            multiplier: Self::default_multiplier(),
            max_attempts: Self::default_max_attempts(),
            sleep_time_ms: Self::default_sleep_time_ms(),
        }
    }
}

/// Settings for the simulated status stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Keywords the stream filters on; one is embedded in every simulated status.
    pub keywords: Vec<String>,
    /// Message logged once at startup.
    pub welcome_message: String,
    /// Minimum number of words in a simulated status.
    pub min_length: usize,
    /// Maximum number of words in a simulated status.
    pub max_length: usize,
    /// Pause between simulated statuses, in milliseconds.
    pub sleep_ms: u64,
}

impl StreamConfig {
    fn default_keywords() -> Vec<String> {
        ["Java", "Microservices", "Kafka", "Elasticsearch"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn default_welcome_message() -> String {
        "Hello microservices!".to_string()
    }

    const fn default_min_length() -> usize {
        5
    }

    const fn default_max_length() -> usize {
        15
    }

    const fn default_sleep_ms() -> u64 {
        10_000
    }

    /// Read the section through a key lookup.
    ///
    /// Supported keys: `STREAM_KEYWORDS` (comma-separated), `WELCOME_MESSAGE`,
    /// `STREAM_MIN_LENGTH`, `STREAM_MAX_LENGTH`, `STREAM_SLEEP_MS`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(val) = lookup("STREAM_KEYWORDS") {
            config.keywords = split_list(&val);
        }
        if let Some(val) = lookup("WELCOME_MESSAGE") {
            config.welcome_message = val;
        }
        parse_into(&lookup, "STREAM_MIN_LENGTH", &mut config.min_length);
        parse_into(&lookup, "STREAM_MAX_LENGTH", &mut config.max_length);
        parse_into(&lookup, "STREAM_SLEEP_MS", &mut config.sleep_ms);
        config
    }

    /// Pause between simulated statuses as a `Duration`.
    #[must_use]
    pub fn sleep(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }

    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty keyword list or an inverted length range.
    pub fn validate(&self) -> Result<()> {
        if self.keywords.is_empty() {
            return Err(CoreError::invalid_config("at least one keyword is required"));
        }
        if self.min_length > self.max_length {
            return Err(CoreError::invalid_config(format!(
                "stream min length {} exceeds max length {}",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keywords: Self::default_keywords(),
            welcome_message: Self::default_welcome_message(),
            min_length: Self::default_min_length(),
            max_length: Self::default_max_length(),
            sleep_ms: Self::default_sleep_ms(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_into<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(val) = lookup(key) {
        if let Ok(parsed) = val.trim().parse() {
            *target = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = RelayConfig::from_lookup(|_| None);
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.kafka.topic_name, "twitter-topic");
        assert_eq!(config.kafka.num_partitions, 3);
        assert_eq!(config.retry.max_attempts, 3);
        assert!((config.retry.multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.stream.keywords.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("KAFKA_TOPIC_NAMES_TO_CREATE", "tweets, audit ,,"),
            ("KAFKA_NUM_PARTITIONS", "6"),
            ("KAFKA_REPLICATION_FACTOR", "1"),
            ("RETRY_MAX_ATTEMPTS", "5"),
            ("RETRY_SLEEP_TIME_MS", "100"),
            ("STREAM_KEYWORDS", "rust"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
        ]));

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        let specs = config.kafka.topic_specs();
        assert_eq!(
            specs,
            vec![TopicSpec::new("tweets", 6, 1), TopicSpec::new("audit", 6, 1)]
        );
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.sleep_time_ms, 100);
        assert_eq!(config.stream.keywords, vec!["rust".to_string()]);
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let config = RetryConfig::from_lookup(lookup_from(&[
            ("RETRY_MAX_ATTEMPTS", "many"),
            ("RETRY_MULTIPLIER", "1.5"),
        ]));
        assert_eq!(config.max_attempts, 3);
        assert!((config.multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_bad_retry() {
        let mut retry = RetryConfig::default();
        retry.max_attempts = 0;
        assert!(retry.validate().is_err());

        let mut retry = RetryConfig::default();
        retry.multiplier = 0.5;
        assert!(retry.validate().is_err());

        let mut retry = RetryConfig::default();
        retry.multiplier = f64::NAN;
        assert!(retry.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_topics() {
        let mut kafka = KafkaConfig::default();
        kafka.topic_names_to_create = vec!["a".into(), " a".into()];
        assert!(kafka.validate().is_err());

        kafka.topic_names_to_create = Vec::new();
        assert!(kafka.validate().is_err());
    }

    #[test]
    fn validate_rejects_partitions_beyond_wire_range() {
        let config = RelayConfig::from_lookup(lookup_from(&[(
            "KAFKA_NUM_PARTITIONS",
            "3000000000",
        )]));
        assert_eq!(config.kafka.num_partitions, 3_000_000_000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_stream_lengths() {
        let mut stream = StreamConfig::default();
        stream.min_length = 20;
        assert!(stream.validate().is_err());

        stream = StreamConfig::default();
        stream.keywords.clear();
        assert!(stream.validate().is_err());
    }

    #[test]
    fn timeout_durations() {
        let kafka = KafkaConfig::default();
        assert_eq!(kafka.admin_timeout(), Duration::from_secs(5));
        assert_eq!(StreamConfig::default().sleep(), Duration::from_secs(10));
    }
}
