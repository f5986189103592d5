use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::db::{
    ActionLogStore, DatabaseError, DatabaseManager, Mention, MentionLog, MentionStore,
    NewActionLogEntry, NewMention,
};
use crate::message::MessageRecord;

/// Persisted record of which remote items have already been processed, plus
/// the append-only audit trail of platform actions.
///
/// The ledger owns all mention persistence. Updaters without a live re-fetch
/// API (Reddit, Telegram, Twitter) also use it as the content source for
/// `message_from_url`.
#[derive(Clone)]
pub struct MentionLedger {
    mentions: Arc<dyn MentionStore>,
    actions: Arc<dyn ActionLogStore>,
}

impl MentionLedger {
    pub fn new(db_manager: &DatabaseManager) -> Self {
        Self {
            mentions: db_manager.mention_store(),
            actions: db_manager.action_log_store(),
        }
    }

    /// True iff the exact `(item_id, platform)` pair has been processed.
    pub async fn is_processed(&self, item_id: &str, platform: &str) -> Result<bool, DatabaseError> {
        self.mentions.mention_exists(item_id, platform).await
    }

    /// Unix timestamp of the newest processed item for the platform, `None`
    /// when nothing has been processed yet. Ingestion pollers use this to
    /// resume from the right point.
    pub async fn last_processed_timestamp(
        &self,
        platform: &str,
    ) -> Result<Option<i64>, DatabaseError> {
        self.mentions.max_item_timestamp(platform).await
    }

    /// Create the immutable mention record for a processed item.
    ///
    /// The payload's `timestamp`, `suggestion_url`, `contribution_url` and
    /// `suggester` fields are materialized into dedicated columns here, at
    /// write time, so later queries never have to reach into the opaque
    /// payload. A second write for the same `(item_id, platform)` pair fails
    /// with [`DatabaseError::Conflict`].
    pub async fn mark_processed(
        &self,
        item_id: &str,
        platform: &str,
        data: Value,
    ) -> Result<Mention, DatabaseError> {
        let mention = NewMention {
            item_id: item_id.to_string(),
            platform: platform.to_string(),
            processed_at: Utc::now(),
            suggester: payload_string(&data, "suggester"),
            item_timestamp: data.get("timestamp").and_then(Value::as_i64),
            suggestion_url: payload_string(&data, "suggestion_url"),
            contribution_url: payload_string(&data, "contribution_url"),
            raw_data: data,
        };
        self.mentions.insert_mention(&mention).await
    }

    /// Canonical message record for the newest stored mention whose
    /// suggestion or contribution URL equals `url`.
    pub async fn message_from_url(&self, url: &str) -> Result<MessageRecord, DatabaseError> {
        match self.mentions.get_mention_by_url(url).await? {
            Some(mention) => Ok(MessageRecord::from_mention(&mention)),
            None => Ok(MessageRecord::not_found(url)),
        }
    }

    pub async fn log_action(
        &self,
        platform: &str,
        action: &str,
        details: &str,
    ) -> Result<MentionLog, DatabaseError> {
        self.actions
            .append(&NewActionLogEntry {
                platform: platform.to_string(),
                timestamp: Utc::now(),
                action: action.to_string(),
                details: details.to_string(),
            })
            .await
    }

    /// Newest-first page of the action log.
    pub async fn recent_actions(&self, limit: i64) -> Result<Vec<MentionLog>, DatabaseError> {
        self.actions.recent(limit).await
    }
}

fn payload_string(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}


#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use serde_json::json;

    use super::test_util::sqlite_ledger;
    use crate::db::DatabaseError;

    #[tokio::test]
    async fn is_processed_matches_the_exact_pair_only() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        ledger
            .mark_processed("item-1", "reddit", json!({"timestamp": 100}))
            .await
            .expect("mark processed");

        assert!(ledger.is_processed("item-1", "reddit").await.expect("query"));
        assert!(
            !ledger
                .is_processed("item-1", "telegram")
                .await
                .expect("query")
        );
        assert!(!ledger.is_processed("item-2", "reddit").await.expect("query"));
    }

    #[tokio::test]
    async fn last_processed_timestamp_returns_platform_maximum() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        ledger
            .mark_processed("201", "telegram", json!({"timestamp": 1_672_531_199}))
            .await
            .expect("mark processed");
        ledger
            .mark_processed("202", "telegram", json!({"timestamp": 1_672_531_200}))
            .await
            .expect("mark processed");
        ledger
            .mark_processed("203", "reddit", json!({"timestamp": 1_999_999_999}))
            .await
            .expect("mark processed");

        let latest = ledger
            .last_processed_timestamp("telegram")
            .await
            .expect("query");
        assert_eq!(latest, Some(1_672_531_200));
    }

    #[tokio::test]
    async fn last_processed_timestamp_is_none_without_timestamped_mentions() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        assert_eq!(
            ledger
                .last_processed_timestamp("telegram")
                .await
                .expect("query"),
            None
        );

        ledger
            .mark_processed("101", "telegram", json!({"key": "value"}))
            .await
            .expect("mark processed");

        assert_eq!(
            ledger
                .last_processed_timestamp("telegram")
                .await
                .expect("query"),
            None
        );
    }

    #[tokio::test]
    async fn mark_processed_materializes_payload_fields() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        let mention = ledger
            .mark_processed(
                "item-9",
                "reddit",
                json!({
                    "suggester": "user9",
                    "suggestion_url": "https://reddit.com/s/9",
                    "contribution_url": "https://reddit.com/c/9",
                    "timestamp": 1_700_000_123,
                }),
            )
            .await
            .expect("mark processed");

        assert_eq!(mention.suggester.as_deref(), Some("user9"));
        assert_eq!(mention.item_timestamp, Some(1_700_000_123));
        assert_eq!(
            mention.suggestion_url.as_deref(),
            Some("https://reddit.com/s/9")
        );
        assert_eq!(
            mention.contribution_url.as_deref(),
            Some("https://reddit.com/c/9")
        );
    }

    #[tokio::test]
    async fn mark_processed_twice_is_a_conflict() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        ledger
            .mark_processed("item-1", "reddit", json!({"timestamp": 100}))
            .await
            .expect("first write");

        let second = ledger
            .mark_processed("item-1", "reddit", json!({"timestamp": 200}))
            .await;
        assert!(matches!(second, Err(DatabaseError::Conflict(_))));

        // The original record is untouched.
        assert_eq!(
            ledger
                .last_processed_timestamp("reddit")
                .await
                .expect("query"),
            Some(100)
        );
    }

    #[tokio::test]
    async fn message_from_url_finds_by_suggestion_and_contribution_url() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        ledger
            .mark_processed(
                "1",
                "twitter",
                json!({
                    "suggestion_url": "https://twitter.com/status/1",
                    "contribution_url": "https://twitter.com/contrib/1",
                    "content": "Tweet content 1",
                    "contribution": "Contribution tweet content 1",
                    "contributor": "userA",
                    "timestamp": 1_678_886_400,
                }),
            )
            .await
            .expect("mark processed");

        let by_suggestion = ledger
            .message_from_url("https://twitter.com/status/1")
            .await
            .expect("lookup");
        assert!(by_suggestion.success);
        assert_eq!(by_suggestion.content.as_deref(), Some("Tweet content 1"));
        assert_eq!(by_suggestion.author.as_deref(), Some("userA"));
        assert_eq!(by_suggestion.message_id.as_deref(), Some("1"));

        let by_contribution = ledger
            .message_from_url("https://twitter.com/contrib/1")
            .await
            .expect("lookup");
        assert!(by_contribution.success);
        assert_eq!(
            by_contribution.contribution.as_deref(),
            Some("Contribution tweet content 1")
        );
    }

    #[tokio::test]
    async fn message_from_url_shapes_the_canonical_record() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        ledger
            .mark_processed(
                "item-42",
                "reddit",
                json!({
                    "suggestion_url": "https://x/1",
                    "timestamp": 1_700_000_000,
                    "content": "hi",
                    "contributor": "bob",
                }),
            )
            .await
            .expect("mark processed");

        let record = ledger.message_from_url("https://x/1").await.expect("lookup");
        assert!(record.success);
        assert_eq!(record.content.as_deref(), Some("hi"));
        assert_eq!(record.author.as_deref(), Some("bob"));
        assert_eq!(record.timestamp.as_deref(), Some("2023-11-14T22:13:20+00:00"));
        assert_eq!(record.message_id.as_deref(), Some("item-42"));
    }

    #[tokio::test]
    async fn message_from_url_reports_missing_urls() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        let record = ledger
            .message_from_url("https://nonexistent.example/url")
            .await
            .expect("lookup");
        assert!(!record.success);
        assert_eq!(
            record.error.as_deref(),
            Some("Message not found for URL: https://nonexistent.example/url")
        );
    }

    #[tokio::test]
    async fn message_from_url_defaults_author_to_unknown() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        ledger
            .mark_processed(
                "item-7",
                "telegram",
                json!({
                    "suggestion_url": "https://t.me/c/-1/7",
                    "timestamp": 1_700_000_000,
                    "content": "hey",
                }),
            )
            .await
            .expect("mark processed");

        let record = ledger
            .message_from_url("https://t.me/c/-1/7")
            .await
            .expect("lookup");
        assert_eq!(record.author.as_deref(), Some("Unknown"));
    }

    #[tokio::test]
    async fn log_action_appends_newest_first() {
        let (ledger, _manager, _file) = sqlite_ledger().await;

        ledger
            .log_action("reddit", "initialized", "Tracking 2 subreddits")
            .await
            .expect("log");
        ledger
            .log_action("discord", "reacted", "ok: https://discord.com/channels/1/2/3")
            .await
            .expect("log");

        let entries = ledger.recent_actions(10).await.expect("read back");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].platform, "discord");
        assert_eq!(entries[0].action, "reacted");
        assert_eq!(entries[1].platform, "reddit");
        assert_eq!(entries[1].details, "Tracking 2 subreddits");
    }
}
