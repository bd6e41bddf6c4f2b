//! Error types for mosic-update

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using mosic-update's error type
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Failures of the update engine
///
/// Policy mismatches (unknown digest algorithm, no asset for this platform)
/// are not errors; they surface as [`crate::UpdateDecision::Aborted`]. An
/// archive without an executable is not an error either; it surfaces as an
/// empty [`crate::InstallOutcome`].
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The request could not be sent or the body could not be read
    #[error("Request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The release metadata could not be decoded
    #[error("Invalid release metadata from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem error
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be opened or read
    #[error("Malformed archive {path:?}: {message}")]
    Archive { path: PathBuf, message: String },

    /// Downloaded bytes do not match the digest the service declared
    #[error("Digest mismatch for {asset}: expected {expected}, got {actual}")]
    DigestMismatch {
        asset: String,
        expected: String,
        actual: String,
    },

    /// The HTTP client could not be configured
    #[error("Invalid update configuration: {0}")]
    Config(String),
}

impl UpdateError {
    /// Create an IO error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed archive error
    pub fn archive(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
