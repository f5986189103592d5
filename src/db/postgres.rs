use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::manager::Pool;
use crate::db::schema::{mention_logs, mentions};

use super::{
    DatabaseError,
    models::{Mention, MentionLog, NewActionLogEntry, NewMention},
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mentions)]
struct DbMention {
    id: i64,
    item_id: String,
    platform: String,
    processed_at: DateTime<Utc>,
    suggester: Option<String>,
    item_timestamp: Option<i64>,
    suggestion_url: Option<String>,
    contribution_url: Option<String>,
    raw_data: String,
}

impl DbMention {
    fn to_mention(self) -> Result<Mention, DatabaseError> {
        Ok(Mention {
            id: self.id,
            item_id: self.item_id,
            platform: self.platform,
            processed_at: self.processed_at,
            suggester: self.suggester,
            item_timestamp: self.item_timestamp,
            suggestion_url: self.suggestion_url,
            contribution_url: self.contribution_url,
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
    processed_at: &'a DateTime<Utc>,
    suggester: Option<&'a str>,
    item_timestamp: Option<i64>,
    suggestion_url: Option<&'a str>,
    contribution_url: Option<&'a str>,
    raw_data: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mention_logs)]
struct DbMentionLog {
    id: i64,
    platform: String,
    timestamp: DateTime<Utc>,
    action: String,
    details: String,
}

impl From<DbMentionLog> for MentionLog {
    fn from(value: DbMentionLog) -> Self {
        Self {
            id: value.id,
            platform: value.platform,
            timestamp: value.timestamp,
            action: value.action,
            details: value.details,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = mention_logs)]
struct NewDbMentionLog<'a> {
    platform: &'a str,
    timestamp: &'a DateTime<Utc>,
    action: &'a str,
    details: &'a str,
}

async fn with_connection<T, F>(pool: Pool, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct PostgresMentionStore {
    pool: Pool,
}

impl PostgresMentionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::MentionStore for PostgresMentionStore {
    async fn mention_exists(
        &self,
        item_id_param: &str,
        platform_param: &str,
    ) -> Result<bool, DatabaseError> {
        let pool = self.pool.clone();
        let item_id_param = item_id_param.to_string();
        let platform_param = platform_param.to_string();
        with_connection(pool, move |conn| {
            use crate::db::schema::mentions::dsl::*;
            diesel::select(diesel::dsl::exists(
                mentions
                    .filter(item_id.eq(item_id_param))
                    .filter(platform.eq(platform_param)),
            ))
            .get_result::<bool>(conn)
            .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn max_item_timestamp(&self, platform_param: &str) -> Result<Option<i64>, DatabaseError> {
        let pool = self.pool.clone();
        let platform_param = platform_param.to_string();
        with_connection(pool, move |conn| {
            use crate::db::schema::mentions::dsl::*;
            mentions
                .filter(platform.eq(platform_param))
                .select(diesel::dsl::max(item_timestamp))
                .first::<Option<i64>>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn insert_mention(&self, mention: &NewMention) -> Result<Mention, DatabaseError> {
        let pool = self.pool.clone();
        let mention = mention.clone();
        with_connection(pool, move |conn| {
            use crate::db::schema::mentions::dsl::*;
            let serialized = serde_json::to_string(&mention.raw_data)
                .map_err(|e| DatabaseError::Query(format!("unserializable raw_data: {e}")))?;
            let new_mention = NewDbMention {
                item_id: &mention.item_id,
                platform: &mention.platform,
                processed_at: &mention.processed_at,
                suggester: mention.suggester.as_deref(),
                item_timestamp: mention.item_timestamp,
                suggestion_url: mention.suggestion_url.as_deref(),
                contribution_url: mention.contribution_url.as_deref(),
                raw_data: serialized,
            };

            diesel::insert_into(mentions)
                .values(&new_mention)
                .execute(conn)
                .map_err(DatabaseError::from_insert_error)?;

            mentions
                .filter(item_id.eq(&mention.item_id))
                .filter(platform.eq(&mention.platform))
                .select(DbMention::as_select())
                .first::<DbMention>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .to_mention()
        })
        .await
    }

    async fn get_mention_by_url(&self, url: &str) -> Result<Option<Mention>, DatabaseError> {
        let pool = self.pool.clone();
        let url = url.to_string();
        with_connection(pool, move |conn| {
            use crate::db::schema::mentions::dsl::*;
            mentions
                .filter(
                    suggestion_url
                        .eq(url.clone())
                        .or(contribution_url.eq(url.clone())),
                )
                .order(processed_at.desc())
                .select(DbMention::as_select())
                .first::<DbMention>(conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|m| m.to_mention())
                .transpose()
        })
        .await
    }
}

pub struct PostgresActionLogStore {
    pool: Pool,
}

impl PostgresActionLogStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::ActionLogStore for PostgresActionLogStore {
    async fn append(&self, entry: &NewActionLogEntry) -> Result<MentionLog, DatabaseError> {
        let pool = self.pool.clone();
        let entry = entry.clone();
        with_connection(pool, move |conn| {
            use crate::db::schema::mention_logs::dsl::*;
            let new_entry = NewDbMentionLog {
                platform: &entry.platform,
                timestamp: &entry.timestamp,
                action: &entry.action,
                details: &entry.details,
            };

            diesel::insert_into(mention_logs)
                .values(&new_entry)
                .execute(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            mention_logs
                .order(id.desc())
                .select(DbMentionLog::as_select())
                .first::<DbMentionLog>(conn)
                .map(Into::into)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn recent(&self, limit: i64) -> Result<Vec<MentionLog>, DatabaseError> {
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
            use crate::db::schema::mention_logs::dsl::*;
            let entries = mention_logs
                .order(timestamp.desc())
                .limit(limit)
                .select(DbMentionLog::as_select())
                .load::<DbMentionLog>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            Ok(entries.into_iter().map(Into::into).collect())
        })
        .await
    }
}
