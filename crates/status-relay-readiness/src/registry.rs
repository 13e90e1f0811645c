//! Schema registry health port.
//!
//! The registry counts as ready once a plain GET on its base URL answers
//! with a 2xx status. Transport faults are reported separately so the
//! checker can log them, but the loop treats them the same as a non-2xx.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PortError;

/// HTTP status code returned by a registry probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeStatus(pub u16);

impl ProbeStatus {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health probe against the schema registry.
#[async_trait]
pub trait RegistryHealthPort: Send + Sync {
    /// Issue one probe and return the response status.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Unreachable`] if no response was received.
    async fn probe(&self) -> Result<ProbeStatus, PortError>;
}

/// Registry health probe over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRegistryHealth {
    client: reqwest::Client,
    url: String,
}

impl HttpRegistryHealth {
    /// Create a probe for the registry at `url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| PortError::Unreachable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, url))
    }

    /// Create a probe with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// The URL being probed.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RegistryHealthPort for HttpRegistryHealth {
    async fn probe(&self) -> Result<ProbeStatus, PortError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PortError::Unreachable(e.to_string()))?;
        Ok(ProbeStatus(response.status().as_u16()))
    }
}

/// Scripted registry for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::VecDeque;

    use super::*;
    use parking_lot::Mutex;

    /// Registry that replays scripted responses, then answers 200.
    #[derive(Debug, Default)]
    pub struct MockRegistry {
        responses: Mutex<VecDeque<Result<ProbeStatus, PortError>>>,
        fallback: Mutex<Option<Result<ProbeStatus, PortError>>>,
        probe_calls: Mutex<u32>,
    }

    impl MockRegistry {
        /// Create a registry that is healthy from the start.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a registry that always answers with `status`.
        #[must_use]
        pub fn always(status: u16) -> Self {
            let registry = Self::new();
            *registry.fallback.lock() = Some(Ok(ProbeStatus(status)));
            registry
        }

        /// Queue a response status.
        pub fn push_status(&self, status: u16) {
            self.responses.lock().push_back(Ok(ProbeStatus(status)));
        }

        /// Queue a transport fault.
        pub fn push_fault(&self, reason: impl Into<String>) {
            self.responses
                .lock()
                .push_back(Err(PortError::Unreachable(reason.into())));
        }

        /// Number of probes issued.
        #[must_use]
        pub fn probe_calls(&self) -> u32 {
            *self.probe_calls.lock()
        }
    }

    #[async_trait]
    impl RegistryHealthPort for MockRegistry {
        async fn probe(&self) -> Result<ProbeStatus, PortError> {
            *self.probe_calls.lock() += 1;
            if let Some(response) = self.responses.lock().pop_front() {
                return response;
            }
            self.fallback.lock().clone().unwrap_or(Ok(ProbeStatus(200)))
        }
    }
}
