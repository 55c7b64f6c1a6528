use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A NOT NULL, CHECK, UNIQUE or foreign key constraint rejected the write.
    #[error("integrity constraint violated: {0}")]
    Integrity(String),

    #[error("password must not be empty")]
    InvalidPassword,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),
}

impl DbError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                Self::Integrity(msg.unwrap_or_else(|| code.to_string()))
            }
            other => Self::Sqlite(other),
        }
    }
}
