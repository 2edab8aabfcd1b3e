//! Crate-level error type

use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;
