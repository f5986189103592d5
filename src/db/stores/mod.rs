use async_trait::async_trait;

use super::DatabaseError;
use super::models::{Mention, MentionLog, NewActionLogEntry, NewMention};

#[async_trait]
pub trait MentionStore: Send + Sync {
    /// True iff a mention with exactly this `(item_id, platform)` pair exists.
    async fn mention_exists(&self, item_id: &str, platform: &str) -> Result<bool, DatabaseError>;

    /// Maximum materialized item timestamp across the platform's mentions,
    /// `None` when the platform has no timestamped mentions.
    async fn max_item_timestamp(&self, platform: &str) -> Result<Option<i64>, DatabaseError>;

    async fn insert_mention(&self, mention: &NewMention) -> Result<Mention, DatabaseError>;

    /// Newest mention whose materialized suggestion or contribution URL
    /// equals `url`.
    async fn get_mention_by_url(&self, url: &str) -> Result<Option<Mention>, DatabaseError>;
}

#[async_trait]
pub trait ActionLogStore: Send + Sync {
    async fn append(&self, entry: &NewActionLogEntry) -> Result<MentionLog, DatabaseError>;

    async fn recent(&self, limit: i64) -> Result<Vec<MentionLog>, DatabaseError>;
}
