//! Engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config type error for `{key}`: expected {expected}")]
    Type { key: String, expected: &'static str },

    #[error("Invalid config value for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Malformed feature context: {0}")]
    MalformedContext(String),
}
