//! Avro codec for status records.
//!
//! Values are written as bare Avro binary datums against [`STATUS_RECORD_SCHEMA`].
//! Keys are the author id as an 8-byte big-endian integer.

use apache_avro::{from_avro_datum, from_value, to_avro_datum, to_value, Schema};
use status_relay_core::StatusRecord;

use crate::error::{KafkaError, Result};

/// Avro schema of a published status record.
pub const STATUS_RECORD_SCHEMA: &str = r#"{
    "type": "record",
    "name": "StatusRecord",
    "namespace": "status_relay",
    "fields": [
        {"name": "userId", "type": "long"},
        {"name": "id", "type": "long"},
        {"name": "text", "type": "string"},
        {"name": "createdAt", "type": "long"}
    ]
}"#;

/// Encodes and decodes [`StatusRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    schema: Schema,
}

impl RecordCodec {
    /// Create a codec for [`STATUS_RECORD_SCHEMA`].
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be parsed.
    pub fn new() -> Result<Self> {
        let schema = Schema::parse_str(STATUS_RECORD_SCHEMA)?;
        Ok(Self { schema })
    }

    /// The parsed record schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Encode a record as an Avro binary datum.
    ///
    /// # Errors
    ///
    /// Returns [`KafkaError::Encoding`] if the record does not fit the schema.
    pub fn encode(&self, record: &StatusRecord) -> Result<Vec<u8>> {
        let value = to_value(record)?
            .resolve(&self.schema)
            .map_err(|e| KafkaError::Encoding(format!("record does not match schema: {e}")))?;
        Ok(to_avro_datum(&self.schema, value)?)
    }

    /// Decode a record from an Avro binary datum.
    ///
    /// # Errors
    ///
    /// Returns [`KafkaError::Encoding`] if the bytes are not a valid datum.
    pub fn decode(&self, mut bytes: &[u8]) -> Result<StatusRecord> {
        let value = from_avro_datum(&self.schema, &mut bytes, None)?;
        Ok(from_value(&value)?)
    }
}

/// Encode a message key.
#[must_use]
pub fn encode_key(user_id: i64) -> [u8; 8] {
    user_id.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StatusRecord {
        StatusRecord {
            user_id: 42,
            id: 1_234_567_890,
            text: "Lorem ipsum Kafka dolor".to_string(),
            created_at: 1_792_413_000_000,
        }
    }

    #[test]
    fn schema_parses() {
        let codec = RecordCodec::new().unwrap();
        assert!(matches!(codec.schema(), Schema::Record(_)));
    }

    #[test]
    fn encoded_record_decodes_back() {
        let codec = RecordCodec::new().unwrap();
        let bytes = codec.encode(&record()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(codec.decode(&bytes).unwrap(), record());
    }

    #[test]
    fn leading_field_is_zigzag_user_id() {
        let codec = RecordCodec::new().unwrap();
        let bytes = codec.encode(&record()).unwrap();
        // zigzag(42) = 84
        assert_eq!(bytes[0], 84);
    }

    #[test]
    fn truncated_datum_is_rejected() {
        let codec = RecordCodec::new().unwrap();
        let bytes = codec.encode(&record()).unwrap();
        assert!(codec.decode(&bytes[..bytes.len() - 2]).is_err());
    }

    #[test]
    fn key_is_big_endian() {
        assert_eq!(encode_key(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encode_key(-1), [0xff; 8]);
    }
}
