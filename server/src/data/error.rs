//! Error type for the data layer

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Integrity constraint a write tripped over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    NotNull,
    Check,
}

#[derive(Error, Debug)]
pub enum DataError {
    /// PostgreSQL driver or server error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// A parameter could not be encoded for the driver
    #[error("Failed to bind parameter: {0}")]
    Bind(String),

    /// A row did not have the expected shape
    #[error("Failed to decode row: {0}")]
    Decode(String),
}

impl DataError {
    pub fn migration_failed(version: i32, name: &str, error: &str) -> Self {
        Self::MigrationFailed {
            version,
            name: name.to_string(),
            error: error.to_string(),
        }
    }

    /// Which integrity constraint, if any, rejected the statement.
    /// sqlx derives the kind from SQLSTATE (23505, 23502, 23514).
    pub fn constraint_violation(&self) -> Option<ConstraintKind> {
        let Self::Postgres(sqlx::Error::Database(db)) = self else {
            return None;
        };
        match db.kind() {
            ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
            ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
            ErrorKind::CheckViolation => Some(ConstraintKind::Check),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.constraint_violation() == Some(ConstraintKind::Unique)
    }

    /// Check if this is a connection-related error that might be transient
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Postgres(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_))
        )
    }
}
