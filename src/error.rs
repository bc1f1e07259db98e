use std::path::PathBuf;
use thiserror::Error;

/// The main error type for mytardis operations.
///
/// Nothing here is retried: each variant describes the single HTTP call (or
/// local step) that failed, and is handed back to the command layer as-is.
#[derive(Debug, Error)]
pub enum MytardisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    ApiRequest {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Not found (HTTP 404): {url}")]
    NotFound { url: String, body: String },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Inconsistent pagination from {url}: {detail}")]
    PaginationConsistency { url: String, detail: String },

    #[error("Malformed JSON response from {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("Index {index} out of range for result set of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl MytardisError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        MytardisError::Configuration {
            message: message.into(),
        }
    }

    /// HTTP status carried by API failures, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            MytardisError::ApiRequest { status, .. } => Some(*status),
            MytardisError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// True for `NotFound` and for a raw 404 `ApiRequest`.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
