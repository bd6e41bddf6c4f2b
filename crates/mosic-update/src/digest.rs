//! Content digests used as version identity
//!
//! Releases are identified by the digest of their assets rather than by
//! version strings: the running binary hashes itself and looks for an asset
//! with the same digest.

use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, UpdateError};

/// The only digest algorithm releases may be compared with
pub const SUPPORTED_DIGEST_ALGORITHM: &str = "sha256";

/// Read buffer size for hashing files (1MB)
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// A server-declared digest in `<algorithm>:<hex>` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDigest {
    /// Algorithm identifier, e.g. "sha256"
    pub algorithm: String,

    /// Hex encoded digest value
    pub value: String,
}

impl AssetDigest {
    /// Create a digest from its parts
    pub fn new(algorithm: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            value: value.into(),
        }
    }

    /// Create a SHA-256 digest
    pub fn sha256(value: impl Into<String>) -> Self {
        Self::new(SUPPORTED_DIGEST_ALGORITHM, value)
    }

    /// Parse the `<algorithm>:<hex>` form
    ///
    /// A string without a separator keeps the whole text as the algorithm
    /// and an empty value, so it is later rejected as unsupported instead of
    /// failing the whole release document.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((algorithm, value)) => Self::new(algorithm.trim(), value.trim()),
            None => Self::new(raw.trim(), ""),
        }
    }

    /// Whether this digest uses the supported algorithm
    pub fn is_supported(&self) -> bool {
        self.algorithm.eq_ignore_ascii_case(SUPPORTED_DIGEST_ALGORITHM)
    }

    /// Whether the hex value equals `other`, ignoring case
    pub fn matches(&self, other: &str) -> bool {
        !self.value.is_empty() && self.value.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for AssetDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

/// Deserialize an optional `<algorithm>:<hex>` string
pub(crate) fn deserialize_digest<'de, D>(deserializer: D) -> std::result::Result<Option<AssetDigest>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(|s| AssetDigest::parse(&s)))
}

/// SHA-256 of a byte buffer as lowercase hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 of a file as lowercase hex, read in chunks
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| UpdateError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| UpdateError::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// The executable the current process was started from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    /// Path of the executable
    pub path: PathBuf,

    /// SHA-256 of the executable's bytes
    pub content_digest: String,
}

impl InstalledBinary {
    /// Describe a binary whose digest is already known
    pub fn new(path: impl Into<PathBuf>, content_digest: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_digest: content_digest.into(),
        }
    }

    /// Hash the binary at `path`
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let hash_path = path.clone();
        let content_digest = tokio::task::spawn_blocking(move || file_sha256(&hash_path))
            .await
            .map_err(|e| UpdateError::io(&path, std::io::Error::other(e)))??;

        debug!("Running binary {:?} has digest {}", path, content_digest);
        Ok(Self {
            path,
            content_digest,
        })
    }

    /// Hash the currently running executable
    pub async fn current() -> Result<Self> {
        let path = std::env::current_exe().map_err(|e| UpdateError::io("<current exe>", e))?;
        Self::from_path(path).await
    }
}
