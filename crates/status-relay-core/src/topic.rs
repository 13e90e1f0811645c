//! Topic specifications.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A topic the relay requires on the broker.
///
/// Topic specs are supplied once from configuration and never change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicSpec {
    /// Exact topic name.
    pub name: String,
    /// Number of partitions to create the topic with.
    pub partition_count: u32,
    /// Replication factor to create the topic with.
    pub replication_factor: u32,
}

impl TopicSpec {
    /// Create a new topic spec. The name is trimmed.
    #[must_use]
    pub fn new(name: impl AsRef<str>, partition_count: u32, replication_factor: u32) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            partition_count,
            replication_factor,
        }
    }

    /// Validate a single spec.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, or a count is zero or does not
    /// fit the broker's 32-bit signed wire type.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CoreError::invalid_config("topic name must not be blank"));
        }
        if self.partition_count == 0 {
            return Err(CoreError::invalid_config(format!(
                "topic {} must have at least one partition",
                self.name
            )));
        }
        if self.replication_factor == 0 {
            return Err(CoreError::invalid_config(format!(
                "topic {} must have a replication factor of at least one",
                self.name
            )));
        }
        if i32::try_from(self.partition_count).is_err() {
            return Err(CoreError::invalid_config(format!(
                "topic {} partition count {} exceeds {}",
                self.name,
                self.partition_count,
                i32::MAX
            )));
        }
        if i32::try_from(self.replication_factor).is_err() {
            return Err(CoreError::invalid_config(format!(
                "topic {} replication factor {} exceeds {}",
                self.name,
                self.replication_factor,
                i32::MAX
            )));
        }
        Ok(())
    }
}

impl fmt::Display for TopicSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(partitions={}, replication={})",
            self.name, self.partition_count, self.replication_factor
        )
    }
}

/// Validate a whole target topic set: non-empty, every spec valid, names unique.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate_topic_set(specs: &[TopicSpec]) -> Result<()> {
    if specs.is_empty() {
        return Err(CoreError::invalid_config("at least one topic is required"));
    }

    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        spec.validate()?;
        if !seen.insert(spec.name.as_str()) {
            return Err(CoreError::invalid_config(format!(
                "duplicate topic name: {}",
                spec.name
            )));
        }
    }
    Ok(())
}
