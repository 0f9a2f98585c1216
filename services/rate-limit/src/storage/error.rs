use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("organization {0} not found")]
    OrganizationNotFound(String),
    #[error("invalid limit value: {0}")]
    InvalidLimitValue(String),
    #[error("connection poisoned")]
    ConnectionPoisoned,
    #[error("blocking task failed: {0}")]
    TaskFailed(String),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}
