use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted record of a remote social-media item that has been ingested.
/// Immutable once written; this subsystem only creates and reads mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: i64,
    pub item_id: String,
    pub platform: String,
    pub processed_at: DateTime<Utc>,
    pub suggester: Option<String>,
    /// Numeric copy of `raw_data.timestamp`, materialized at write time.
    pub item_timestamp: Option<i64>,
    pub suggestion_url: Option<String>,
    pub contribution_url: Option<String>,
    pub raw_data: Value,
}

/// Fields for a mention about to be written. The materialized columns are
/// extracted from the payload by the ledger before the store sees it.
#[derive(Debug, Clone)]
pub struct NewMention {
    pub item_id: String,
    pub platform: String,
    pub processed_at: DateTime<Utc>,
    pub suggester: Option<String>,
    pub item_timestamp: Option<i64>,
    pub suggestion_url: Option<String>,
    pub contribution_url: Option<String>,
    pub raw_data: Value,
}

/// Append-only audit entry for an action taken against a platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionLog {
    pub id: i64,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct NewActionLogEntry {
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: String,
}
