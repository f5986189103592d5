use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::schema_sqlite::{mention_logs, mentions};

use super::{
    DatabaseError,
    models::{Mention, MentionLog, NewActionLogEntry, NewMention},
};

// SQLite keeps datetimes as RFC 3339 text and INTEGER primary keys as i32;
// the store API stays on DateTime<Utc> and i64.
fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("invalid datetime format: {}", e)))
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mentions)]
struct DbMention {
    id: i32,
    item_id: String,
    platform: String,
    processed_at: String,
    suggester: Option<String>,
    item_timestamp: Option<i64>,
    suggestion_url: Option<String>,
    contribution_url: Option<String>,
    raw_data: String,
}

impl DbMention {
    fn to_mention(&self) -> Result<Mention, DatabaseError> {
        Ok(Mention {
            id: self.id as i64,
            item_id: self.item_id.clone(),
            platform: self.platform.clone(),
            processed_at: string_to_datetime(&self.processed_at)?,
            suggester: self.suggester.clone(),
            item_timestamp: self.item_timestamp,
            suggestion_url: self.suggestion_url.clone(),
            contribution_url: self.contribution_url.clone(),
            raw_data: serde_json::from_str(&self.raw_data)
                .map_err(|e| DatabaseError::Query(format!("invalid raw_data payload: {e}")))?,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = mentions)]
struct NewDbMention<'a> {
    item_id: &'a str,
    platform: &'a str,
    processed_at: String,
    suggester: Option<&'a str>,
    item_timestamp: Option<i64>,
    suggestion_url: Option<&'a str>,
    contribution_url: Option<&'a str>,
    raw_data: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mention_logs)]
struct DbMentionLog {
    id: i32,
    platform: String,
    timestamp: String,
    action: String,
    details: String,
}

impl DbMentionLog {
    fn to_log(&self) -> Result<MentionLog, DatabaseError> {
        Ok(MentionLog {
            id: self.id as i64,
            platform: self.platform.clone(),
            timestamp: string_to_datetime(&self.timestamp)?,
            action: self.action.clone(),
            details: self.details.clone(),
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = mention_logs)]
struct NewDbMentionLog<'a> {
    platform: &'a str,
    timestamp: String,
    action: &'a str,
    details: &'a str,
}

fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    SqliteConnection::establish(path).map_err(|e| DatabaseError::Connection(e.to_string()))
}

pub struct SqliteMentionStore {
    db_path: Arc<String>,
}

impl SqliteMentionStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::MentionStore for SqliteMentionStore {
    async fn mention_exists(
        &self,
        item_id_param: &str,
        platform_param: &str,
    ) -> Result<bool, DatabaseError> {
        let item_id_param = item_id_param.to_string();
        let platform_param = platform_param.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::mentions::dsl::*;
            diesel::select(diesel::dsl::exists(
                mentions
                    .filter(item_id.eq(item_id_param))
                    .filter(platform.eq(platform_param)),
            ))
            .get_result::<bool>(&mut conn)
            .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn max_item_timestamp(&self, platform_param: &str) -> Result<Option<i64>, DatabaseError> {
        let platform_param = platform_param.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::mentions::dsl::*;
            mentions
                .filter(platform.eq(platform_param))
                .select(diesel::dsl::max(item_timestamp))
                .first::<Option<i64>>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn insert_mention(&self, mention: &NewMention) -> Result<Mention, DatabaseError> {
        let mention = mention.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::mentions::dsl::*;
            let serialized = serde_json::to_string(&mention.raw_data)
                .map_err(|e| DatabaseError::Query(format!("unserializable raw_data: {e}")))?;
            let new_mention = NewDbMention {
                item_id: &mention.item_id,
                platform: &mention.platform,
                processed_at: datetime_to_string(&mention.processed_at),
                suggester: mention.suggester.as_deref(),
                item_timestamp: mention.item_timestamp,
                suggestion_url: mention.suggestion_url.as_deref(),
                contribution_url: mention.contribution_url.as_deref(),
                raw_data: serialized,
            };

            diesel::insert_into(mentions)
                .values(&new_mention)
                .execute(&mut conn)
                .map_err(DatabaseError::from_insert_error)?;

            mentions
                .filter(item_id.eq(&mention.item_id))
                .filter(platform.eq(&mention.platform))
                .select(DbMention::as_select())
                .first::<DbMention>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .to_mention()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn get_mention_by_url(&self, url: &str) -> Result<Option<Mention>, DatabaseError> {
        let url = url.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::mentions::dsl::*;
            mentions
                .filter(
                    suggestion_url
                        .eq(url.clone())
                        .or(contribution_url.eq(url.clone())),
                )
                .order(id.desc())
                .select(DbMention::as_select())
                .first::<DbMention>(&mut conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|m| m.to_mention())
                .transpose()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct SqliteActionLogStore {
    db_path: Arc<String>,
}

impl SqliteActionLogStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::ActionLogStore for SqliteActionLogStore {
    async fn append(&self, entry: &NewActionLogEntry) -> Result<MentionLog, DatabaseError> {
        let entry = entry.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::mention_logs::dsl::*;
            let new_entry = NewDbMentionLog {
                platform: &entry.platform,
                timestamp: datetime_to_string(&entry.timestamp),
                action: &entry.action,
                details: &entry.details,
            };

            diesel::insert_into(mention_logs)
                .values(&new_entry)
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            mention_logs
                .order(id.desc())
                .select(DbMentionLog::as_select())
                .first::<DbMentionLog>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .to_log()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn recent(&self, limit: i64) -> Result<Vec<MentionLog>, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::mention_logs::dsl::*;
            let entries = mention_logs
                .order(id.desc())
                .limit(limit)
                .select(DbMentionLog::as_select())
                .load::<DbMentionLog>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            entries.into_iter().map(|entry| entry.to_log()).collect()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
