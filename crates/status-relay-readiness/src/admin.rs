//! Broker admin port.
//!
//! The readiness loops only need two admin operations: submit a creation
//! request for a topic set, and list the topics the cluster currently knows.

use async_trait::async_trait;
use status_relay_core::TopicSpec;

use crate::error::PortError;

/// A topic as reported by the cluster listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicListing {
    /// Topic name.
    pub name: String,
}

impl TopicListing {
    /// Create a listing entry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Per-topic result of a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicCreationStatus {
    /// The broker accepted the topic.
    Created,
    /// The topic was already present.
    AlreadyExists,
    /// The broker refused the topic.
    Rejected(String),
}

/// Result of a single creation request.
///
/// A request that reaches the broker always yields an outcome, even when
/// individual topics are rejected. Whether a topic is actually usable is
/// decided by the verification loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationOutcome {
    /// One entry per requested topic.
    pub results: Vec<(String, TopicCreationStatus)>,
}

impl CreationOutcome {
    /// Names of topics the broker rejected, with the reason.
    pub fn rejected(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results.iter().filter_map(|(name, status)| match status {
            TopicCreationStatus::Rejected(reason) => Some((name.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Number of topics newly created by this request.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, status)| *status == TopicCreationStatus::Created)
            .count()
    }
}

/// Broker admin operations used by the topic readiness checker.
#[async_trait]
pub trait AdminPort: Send + Sync {
    /// Submit a creation request for every topic in `specs`.
    ///
    /// Topics that already exist must not make the request fail.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::AdminUnavailable`] if the request could not be
    /// delivered to the cluster.
    async fn create_topics(&self, specs: &[TopicSpec]) -> Result<CreationOutcome, PortError>;

    /// List the topics the cluster currently reports.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::AdminUnavailable`] if the listing could not be
    /// fetched.
    async fn list_topics(&self) -> Result<Vec<TopicListing>, PortError>;
}

/// In-memory admin for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::{BTreeSet, VecDeque};

    use super::*;
    use parking_lot::Mutex;

    /// Admin port backed by an in-memory topic set.
    ///
    /// Created topics show up in the listing immediately unless
    /// materialization is disabled. Scripted listings take priority over the
    /// real state until the script runs out.
    #[derive(Debug)]
    pub struct MockAdmin {
        topics: Mutex<BTreeSet<String>>,
        scripted_listings: Mutex<VecDeque<Result<Vec<TopicListing>, PortError>>>,
        materialize: Mutex<bool>,
        creation_failures: Mutex<u32>,
        create_calls: Mutex<Vec<Vec<TopicSpec>>>,
        list_calls: Mutex<u32>,
    }

    impl Default for MockAdmin {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockAdmin {
        /// Create an admin with no topics.
        #[must_use]
        pub fn new() -> Self {
            Self {
                topics: Mutex::new(BTreeSet::new()),
                scripted_listings: Mutex::new(VecDeque::new()),
                materialize: Mutex::new(true),
                creation_failures: Mutex::new(0),
                create_calls: Mutex::new(Vec::new()),
                list_calls: Mutex::new(0),
            }
        }

        /// Create an admin that already has `names`.
        #[must_use]
        pub fn with_topics<I, S>(names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let admin = Self::new();
            admin
                .topics
                .lock()
                .extend(names.into_iter().map(Into::into));
            admin
        }

        /// Queue a listing result to return before falling back to real state.
        pub fn push_listing(&self, listing: Result<Vec<TopicListing>, PortError>) {
            self.scripted_listings.lock().push_back(listing);
        }

        /// Queue a listing containing exactly `names`.
        pub fn push_names(&self, names: &[&str]) {
            self.push_listing(Ok(names.iter().map(|n| TopicListing::new(*n)).collect()));
        }

        /// Whether created topics become visible in the listing.
        pub fn set_materialize(&self, materialize: bool) {
            *self.materialize.lock() = materialize;
        }

        /// Fail the next `times` creation requests.
        pub fn fail_creation(&self, times: u32) {
            *self.creation_failures.lock() = times;
        }

        /// Topic sets passed to every creation request, in order.
        #[must_use]
        pub fn create_calls(&self) -> Vec<Vec<TopicSpec>> {
            self.create_calls.lock().clone()
        }

        /// Number of listing calls made.
        #[must_use]
        pub fn list_calls(&self) -> u32 {
            *self.list_calls.lock()
        }

        /// Names currently known to the mock cluster.
        #[must_use]
        pub fn topic_names(&self) -> Vec<String> {
            self.topics.lock().iter().cloned().collect()
        }
    }

    #[async_trait]
    impl AdminPort for MockAdmin {
        async fn create_topics(&self, specs: &[TopicSpec]) -> Result<CreationOutcome, PortError> {
            self.create_calls.lock().push(specs.to_vec());

            {
                let mut failures = self.creation_failures.lock();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(PortError::AdminUnavailable("broker not reachable".into()));
                }
            }

            let materialize = *self.materialize.lock();
            let mut topics = self.topics.lock();
            let results = specs
                .iter()
                .map(|spec| {
                    let status = if topics.contains(&spec.name) {
                        TopicCreationStatus::AlreadyExists
                    } else {
                        if materialize {
                            topics.insert(spec.name.clone());
                        }
                        TopicCreationStatus::Created
                    };
                    (spec.name.clone(), status)
                })
                .collect();
            Ok(CreationOutcome { results })
        }

        async fn list_topics(&self) -> Result<Vec<TopicListing>, PortError> {
            *self.list_calls.lock() += 1;
            if let Some(scripted) = self.scripted_listings.lock().pop_front() {
                return scripted;
            }
            Ok(self
                .topics
                .lock()
                .iter()
                .map(|name| TopicListing::new(name.clone()))
                .collect())
        }
    }
}
