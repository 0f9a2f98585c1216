use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("email service unreachable: {0}")]
    Unreachable(String),

    #[error("email service rejected notification (status {status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("invalid response from email service: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DispatchError::InvalidResponse(err.to_string())
        } else {
            DispatchError::Unreachable(err.to_string())
        }
    }
}
