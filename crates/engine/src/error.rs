//! The module contains the errors the engine can throw.
//!
//! Every variant is a local validation failure: the engine never performs I/O,
//! so anything it rejects is rejected before a request is attempted.
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid event type: {0}")]
    InvalidEventType(String),
    #[error("Invalid budget id: {0}")]
    InvalidId(String),
    #[error("Invalid installments: {0}")]
    InvalidInstallments(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}
