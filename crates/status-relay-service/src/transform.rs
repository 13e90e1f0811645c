//! Status to record transformation.

use status_relay_core::{Status, StatusRecord};

/// Flattens a [`Status`] into the [`StatusRecord`] published to the broker.
#[derive(Debug, Clone, Default)]
pub struct StatusTransformer;

impl StatusTransformer {
    /// Build the record for `status`. The timestamp becomes epoch millis.
    #[must_use]
    pub fn to_record(&self, status: &Status) -> StatusRecord {
        StatusRecord {
            user_id: status.user.id,
            id: status.id,
            text: status.text.clone(),
            created_at: status.created_at.timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_fields_and_converts_timestamp() {
        let status = Status::from_json(
            r#"{"created_at":"Thu Jan 01 00:00:01 +0000 1970","id":"5","text":"Kafka","user":{"id":"9"}}"#,
        )
        .unwrap();

        let record = StatusTransformer.to_record(&status);
        assert_eq!(
            record,
            StatusRecord {
                user_id: 9,
                id: 5,
                text: "Kafka".to_string(),
                created_at: 1000,
            }
        );
    }
}
