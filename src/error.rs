//! Error types for the JMA client, forecast extraction and the local cache.

use thiserror::Error;

/// Failure talking to one of the JMA endpoints.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// The forecast payload did not have the shape the headline is read from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Forecast payload is empty")]
    Empty,

    #[error("Forecast payload is missing {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Could not create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failure building a lookup at startup.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Client(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Why a lookup produced no forecast.
#[derive(Error, Debug)]
pub enum LookupFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}
