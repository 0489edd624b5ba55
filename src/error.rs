//! # Error Types
//!
//! Errors raised by the fetch layer, configuration loading and tracker setup.
//! The chart pipeline has no error type: it degrades instead of failing.

use thiserror::Error;

/// Failure of a deduplicated fetch.
///
/// Every caller sharing one in-flight request receives a clone of the same
/// error, so payloads are kept as owned strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("malformed JSON from {url}: {message}")]
    Json { url: String, message: String },
}

impl FetchError {
    /// The URL the failed request was addressed to.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Json { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{name} must be {expected}, got {value:?}")]
    Env {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("{vendor}: no tracking ids supplied")]
    NoIds { vendor: &'static str },

    #[error("{vendor}: invalid tracking id {id:?}")]
    InvalidId { vendor: &'static str, id: String },
}
