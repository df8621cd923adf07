use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to read pool directory {dir}: {source}")]
    ReadDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse pool file {file}: {reason}")]
    PoolFile { file: PathBuf, reason: String },
}

/// Errors produced by a single status fetch attempt.
///
/// Every variant is recovered inside the poll cycle: the worker logs it and
/// keeps serving the last good snapshot.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("status helper timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error during status fetch: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("status payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
