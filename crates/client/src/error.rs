use engine::{BudgetId, EngineError};
use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single call to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("rejected by server: {0}")]
    Validation(String),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid base_url: {0}")]
    BaseUrl(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token expired")]
    Expired,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Failure of a budget store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session expired, log in again")]
    SessionExpired,
    #[error("budget {0} not found")]
    UnknownBudget(BudgetId),
    #[error(transparent)]
    Invalid(#[from] EngineError),
    #[error(transparent)]
    Api(ApiError),
}

impl From<ApiError> for StoreError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Unauthorized => Self::SessionExpired,
            other => Self::Api(other),
        }
    }
}
