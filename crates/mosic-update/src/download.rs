//! Artifact download with progress reporting and digest verification
//!
//! Artifacts are fetched in full into memory; there are no partial or
//! resumable downloads and no retries. A failed download abandons the update.

use bytes::BytesMut;
use futures_util::StreamExt;
use mosic_core::RuntimeConfig;
use std::time::Duration;
use tracing::{debug, info};

use crate::digest::sha256_hex;
use crate::error::{Result, UpdateError};
use crate::releases::ReleaseAsset;

/// Upper bound for pre-allocating the body from a Content-Length header
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Download progress information
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Total bytes to download, 0 when the server did not announce a length
    pub total_bytes: u64,

    /// Bytes downloaded so far
    pub downloaded_bytes: u64,

    /// Progress percentage (0-100)
    pub percentage: f64,
}

impl DownloadProgress {
    /// Create a new progress tracker
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            downloaded_bytes: 0,
            percentage: 0.0,
        }
    }

    /// Update progress with new downloaded bytes
    pub fn update(&mut self, downloaded_bytes: u64) {
        self.downloaded_bytes = downloaded_bytes;
        self.percentage = if self.total_bytes > 0 {
            (self.downloaded_bytes as f64 / self.total_bytes as f64) * 100.0
        } else {
            0.0
        };
    }

    /// Check if download is complete
    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.downloaded_bytes >= self.total_bytes
    }
}

/// HTTP downloader for release artifacts
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Create a downloader from the runtime configuration
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.network.user_agent)
            .timeout(Duration::from_secs(config.network.download_timeout_secs))
            .build()
            .map_err(|e| UpdateError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Create a downloader around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the full body at `url`, reporting progress per received chunk
    pub async fn fetch(
        &self,
        url: &str,
        on_progress: &mut (dyn FnMut(&DownloadProgress) + Send),
    ) -> Result<Vec<u8>> {
        debug!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| UpdateError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Status {
                url: url.to_string(),
                status,
            });
        }

        let mut progress = DownloadProgress::new(response.content_length().unwrap_or(0));
        on_progress(&progress);

        let mut body = BytesMut::with_capacity(progress.total_bytes.min(MAX_PREALLOC) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| UpdateError::Fetch {
                url: url.to_string(),
                source,
            })?;
            body.extend_from_slice(&chunk);

            progress.update(body.len() as u64);
            on_progress(&progress);
        }

        info!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }

    /// Fetch an asset and check its bytes against the declared digest
    pub async fn fetch_asset(
        &self,
        asset: &ReleaseAsset,
        verify_digest: bool,
        on_progress: &mut (dyn FnMut(&DownloadProgress) + Send),
    ) -> Result<Vec<u8>> {
        let bytes = self.fetch(&asset.download_url, on_progress).await?;

        if verify_digest {
            verify_asset_digest(asset, &bytes)?;
        }

        Ok(bytes)
    }
}

/// Compare downloaded bytes with the asset's declared SHA-256 digest
///
/// Assets without a supported digest are not checked; the update detector
/// never offers them.
pub fn verify_asset_digest(asset: &ReleaseAsset, bytes: &[u8]) -> Result<()> {
    let Some(expected) = asset.digest.as_ref().filter(|d| d.is_supported()) else {
        debug!("No verifiable digest for {}, skipping check", asset.name);
        return Ok(());
    };

    let actual = sha256_hex(bytes);
    if !expected.matches(&actual) {
        return Err(UpdateError::DigestMismatch {
            asset: asset.name.clone(),
            expected: expected.value.clone(),
            actual,
        });
    }

    debug!("Digest verified for {}", asset.name);
    Ok(())
}
