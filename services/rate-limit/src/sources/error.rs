use reqwest::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum SourceFetchError {
    #[error("ownership store read failed: {0}")]
    Ownership(String),

    #[error("usage estimator unreachable: {0}")]
    UsageUnreachable(String),

    #[error("usage estimator returned error (status {status}): {message}")]
    UsageRejected { status: StatusCode, message: String },

    #[error("invalid response from usage estimator: {0}")]
    InvalidResponse(String),
}

impl From<StorageError> for SourceFetchError {
    fn from(err: StorageError) -> Self {
        SourceFetchError::Ownership(err.to_string())
    }
}

impl From<reqwest::Error> for SourceFetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceFetchError::InvalidResponse(err.to_string())
        } else {
            SourceFetchError::UsageUnreachable(err.to_string())
        }
    }
}
