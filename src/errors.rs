// src/errors.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problems detected while building a scan configuration.
///
/// These are the only errors that ever reach the caller of a scan: they are
/// raised before the first lookup is dispatched, so a run either starts with a
/// valid configuration or does not start at all.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target domain is empty")]
    EmptyTarget,

    #[error("'{0}' is not a valid domain name")]
    InvalidTarget(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: &'static str,
    },

    #[error("cannot read wordlist {}: {source}", path.display())]
    Wordlist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures while writing a report to disk.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV writer could not be flushed: {0}")]
    CsvFlush(String),
}
