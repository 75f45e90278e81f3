use std::io;

use thiserror::Error;

/// Failures a caller of a lookup has to handle.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("account number is empty after normalization")]
    InvalidIdentifier,
    #[error("partition manifest '{location}' is unavailable: {reason}")]
    ManifestUnavailable { location: String, reason: String },
    #[error("account {account} not found")]
    AccountNotFound { account: String },
}

/// Transport failure for one named resource (manifest or partition).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("'{name}' does not exist")]
    Missing { name: String },
    #[error("'{name}' answered with HTTP status {status}")]
    Status { name: String, status: u16 },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("input has no header row")]
    EmptyHeader,
    #[error("worksheet '{sheet}' not found (available: {available})")]
    MissingSheet { sheet: String, available: String },
    #[error(transparent)]
    Workbook(#[from] calamine::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
