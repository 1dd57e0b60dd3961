use textscope_sync::{LockError, PoolError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),
    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TextscopeError>;
