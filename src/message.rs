use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::Mention;

/// Canonical message record returned by every `message_from_url`
/// implementation, independent of source platform.
///
/// `success == false` implies the content fields are absent and `error` is
/// populated; `success == true` implies every content field carries a value
/// (the author falls back to `"Unknown"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageRecord {
    pub fn found(
        content: impl Into<String>,
        contribution: impl Into<String>,
        author: impl Into<String>,
        timestamp: impl Into<String>,
        message_id: impl Into<String>,
        raw_data: Value,
    ) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            contribution: Some(contribution.into()),
            author: Some(author.into()),
            timestamp: Some(timestamp.into()),
            message_id: Some(message_id.into()),
            raw_data: Some(raw_data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            contribution: None,
            author: None,
            timestamp: None,
            message_id: None,
            raw_data: None,
            error: Some(error.into()),
        }
    }

    pub fn not_found(url: &str) -> Self {
        Self::failure(format!("Message not found for URL: {url}"))
    }

    /// Shape a stored mention into the canonical record.
    ///
    /// The materialized item timestamp is rendered as RFC 3339; records
    /// ingested without one fall back to their processing time.
    pub fn from_mention(mention: &Mention) -> Self {
        let timestamp = mention
            .item_timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or(mention.processed_at)
            .to_rfc3339();

        let content = payload_str(&mention.raw_data, "content");
        let contribution = payload_str(&mention.raw_data, "contribution");
        let author = mention
            .raw_data
            .get("contributor")
            .and_then(Value::as_str)
            .unwrap_or("Unknown");

        Self::found(
            content,
            contribution,
            author,
            timestamp,
            mention.item_id.clone(),
            mention.raw_data.clone(),
        )
    }
}

fn payload_str<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("")
}
