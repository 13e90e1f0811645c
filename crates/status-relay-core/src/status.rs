//! Status stream payloads and the record published for each of them.
//!
//! A [`Status`] is what the stream delivers, decoded from its raw JSON. A
//! [`StatusRecord`] is the flattened form written to the broker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Textual timestamp format used by the status stream, e.g.
/// `Mon Oct 19 12:30:00 +0000 2026`.
pub const STATUS_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Author of a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUser {
    /// Numeric user id.
    #[serde(with = "flexible_id")]
    pub id: i64,
}

/// A single status as delivered by the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// When the status was posted.
    #[serde(with = "status_date")]
    pub created_at: DateTime<Utc>,
    /// Numeric status id.
    #[serde(with = "flexible_id")]
    pub id: i64,
    /// Status text.
    pub text: String,
    /// Author of the status.
    pub user: StatusUser,
}

impl Status {
    /// Decode a status from the stream's raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::MalformedStatus`] if the JSON does not match.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// The record published to the broker for every status.
///
/// Field names follow the Avro schema the record is encoded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// Id of the author; also used as the message key.
    pub user_id: i64,
    /// Id of the status.
    pub id: i64,
    /// Status text.
    pub text: String,
    /// Posting time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

mod status_date {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::STATUS_DATE_FORMAT;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(STATUS_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&raw, STATUS_DATE_FORMAT)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("invalid status date {raw:?}: {e}")))
    }
}

/// Ids arrive either as JSON numbers or as decimal strings.
mod flexible_id {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(n),
            RawId::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| de::Error::custom(format!("invalid id {s:?}: {e}"))),
        }
    }
}
