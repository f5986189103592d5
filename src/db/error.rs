use diesel::result::DatabaseErrorInformation as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database query error: {0}")]
    Query(String),

    #[error("database migration error: {0}")]
    Migration(String),

    /// A write collided with an existing record, e.g. marking the same
    /// `(item_id, platform)` pair processed twice.
    #[error("conflicting record: {0}")]
    Conflict(String),
}

impl DatabaseError {
    pub(crate) fn from_insert_error(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => DatabaseError::Conflict(info.message().to_string()),
            other => DatabaseError::Query(other.to_string()),
        }
    }
}
