use thiserror::Error;

/// Failures surfaced by `snapshot()` / `restore()`. A cold start with no
/// stored snapshot is not an error.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("schema migration failed: {0}")]
    Migration(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SleepError {
    #[error("not sleeping")]
    NotSleeping,
}
