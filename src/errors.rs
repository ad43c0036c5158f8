// src/errors.rs

//! Crate-wide error types.
//!
//! [`SyncError`] is the taxonomy surfaced by the polling / merge / DAG layer.
//! It is `Clone` so that a single coalesced refresh can hand the same failure
//! to every caller waiting on it. [`HistdagError`] wraps it together with the
//! startup failures (config, IO, TOML) that only the binary cares about.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Transport failure or non-2xx response.
    #[error("network error{}: {message}", fmt_status(.status))]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The job graph contains a cycle; the ids are every node taking part in it.
    #[error("cycle detected in job DAG involving: {}", .0.join(", "))]
    CyclicGraph(Vec<String>),

    /// The polling driver gave up.
    #[error("polling exhausted after {attempts} attempts: {reason}")]
    PollExhausted { attempts: u32, reason: ExhaustReason },
}

/// Why the polling driver moved to `StoppedExhausted`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExhaustReason {
    #[error("{failures} consecutive refresh failures, last: {last}")]
    TooManyFailures { failures: u32, last: Box<SyncError> },

    #[error("non-retryable refresh failure: {0}")]
    NonRetryable(Box<SyncError>),

    #[error("attempt limit of {0} reached")]
    AttemptLimit(u32),

    #[error("deadline of {0:?} elapsed")]
    DeadlineElapsed(Duration),
}

impl SyncError {
    pub fn network(message: impl Into<String>) -> Self {
        SyncError::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        SyncError::Network {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Errors the polling driver may retry. A cycle is a data bug and retrying
    /// will not fix it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Network { .. } | SyncError::Decode(_))
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum HistdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HistdagError>;
