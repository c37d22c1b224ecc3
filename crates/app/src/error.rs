use client::{ApiError, SessionError, StoreError};
use engine::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("unknown timezone `{0}`")]
    Timezone(String),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Invalid(#[from] EngineError),
    #[error("not logged in, run `orcafoto login` first")]
    NotLoggedIn,
    #[error("{0}")]
    Input(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Store failures already reached the user as a notice.
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
