use crate::config::{DatabaseConfig as ConfigDatabaseConfig, DbType as ConfigDbType};
use crate::db::{ActionLogStore, DatabaseError, MentionStore};
use std::sync::Arc;

#[cfg(feature = "postgres")]
use crate::db::postgres::{PostgresActionLogStore, PostgresMentionStore};
#[cfg(feature = "postgres")]
use diesel::RunQueryDsl;
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
use diesel::r2d2::{self, ConnectionManager};

#[cfg(feature = "postgres")]
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{SqliteActionLogStore, SqliteMentionStore};
#[cfg(feature = "sqlite")]
use diesel::Connection;
#[cfg(feature = "sqlite")]
use diesel::sqlite::SqliteConnection;
#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
use diesel::RunQueryDsl;

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "postgres")]
    postgres_pool: Option<Pool>,
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<String>,
    mention_store: Arc<dyn MentionStore>,
    action_log_store: Arc<dyn ActionLogStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Postgres => DbType::Postgres,
            ConfigDbType::Sqlite => DbType::Sqlite,
        }
    }
}

impl DatabaseManager {
    pub async fn new(config: &ConfigDatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let connection_string = config.connection_string();
                let max_connections = config.max_connections();
                let min_connections = config.min_connections();

                let manager = ConnectionManager::<PgConnection>::new(connection_string);

                let builder = r2d2::Pool::builder()
                    .max_size(max_connections.unwrap_or(10))
                    .min_idle(Some(min_connections.unwrap_or(1)));

                let pool = builder
                    .build(manager)
                    .map_err(|e| DatabaseError::Connection(e.to_string()))?;

                let mention_store = Arc::new(PostgresMentionStore::new(pool.clone()));
                let action_log_store = Arc::new(PostgresActionLogStore::new(pool.clone()));

                Ok(Self {
                    postgres_pool: Some(pool),
                    #[cfg(feature = "sqlite")]
                    sqlite_path: None,
                    mention_store,
                    action_log_store,
                    db_type,
                })
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config
                    .sqlite_path()
                    .ok_or_else(|| DatabaseError::Connection("missing sqlite path".to_string()))?;
                let path_arc = Arc::new(path.clone());

                let mention_store = Arc::new(SqliteMentionStore::new(path_arc.clone()));
                let action_log_store = Arc::new(SqliteActionLogStore::new(path_arc));

                Ok(Self {
                    #[cfg(feature = "postgres")]
                    postgres_pool: None,
                    sqlite_path: Some(path),
                    mention_store,
                    action_log_store,
                    db_type,
                })
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match self.db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let pool = self.postgres_pool.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("postgres pool not initialized".to_string())
                })?;
                Self::migrate_postgres(pool).await
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = self.sqlite_path.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("sqlite path not initialized".to_string())
                })?;
                Self::migrate_sqlite(path).await
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Migration(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    #[cfg(feature = "postgres")]
    async fn migrate_postgres(pool: &Pool) -> Result<(), DatabaseError> {
        let pool = pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS mentions (
                    id BIGSERIAL PRIMARY KEY,
                    item_id TEXT NOT NULL,
                    platform TEXT NOT NULL,
                    processed_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                    suggester TEXT,
                    item_timestamp BIGINT,
                    suggestion_url TEXT,
                    contribution_url TEXT,
                    raw_data TEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS mention_logs (
                    id BIGSERIAL PRIMARY KEY,
                    platform TEXT NOT NULL,
                    timestamp TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                    action TEXT NOT NULL,
                    details TEXT NOT NULL DEFAULT ''
                )
                "#,
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_mentions_item_platform ON mentions(item_id, platform)",
                "CREATE INDEX IF NOT EXISTS idx_mentions_platform ON mentions(platform)",
                "CREATE INDEX IF NOT EXISTS idx_mentions_suggestion_url ON mentions(suggestion_url)",
                "CREATE INDEX IF NOT EXISTS idx_mentions_contribution_url ON mentions(contribution_url)",
                "CREATE INDEX IF NOT EXISTS idx_mention_logs_timestamp ON mention_logs(timestamp)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(path: &str) -> Result<(), DatabaseError> {
        let path = path.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = SqliteConnection::establish(&path)
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS mentions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    item_id TEXT NOT NULL,
                    platform TEXT NOT NULL,
                    processed_at TEXT NOT NULL DEFAULT (datetime('now')),
                    suggester TEXT,
                    item_timestamp BIGINT,
                    suggestion_url TEXT,
                    contribution_url TEXT,
                    raw_data TEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS mention_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    platform TEXT NOT NULL,
                    timestamp TEXT NOT NULL DEFAULT (datetime('now')),
                    action TEXT NOT NULL,
                    details TEXT NOT NULL DEFAULT ''
                )
                "#,
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_mentions_item_platform ON mentions(item_id, platform)",
                "CREATE INDEX IF NOT EXISTS idx_mentions_platform ON mentions(platform)",
                "CREATE INDEX IF NOT EXISTS idx_mentions_suggestion_url ON mentions(suggestion_url)",
                "CREATE INDEX IF NOT EXISTS idx_mentions_contribution_url ON mentions(contribution_url)",
                "CREATE INDEX IF NOT EXISTS idx_mention_logs_timestamp ON mention_logs(timestamp)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn mention_store(&self) -> Arc<dyn MentionStore> {
        self.mention_store.clone()
    }

    pub fn action_log_store(&self) -> Arc<dyn ActionLogStore> {
        self.action_log_store.clone()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}
