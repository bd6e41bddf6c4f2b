//! Release metadata from the release hosting service

use mosic_core::RuntimeConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::digest::{deserialize_digest, AssetDigest};
use crate::error::{Result, UpdateError};

/// Endpoint listing all releases, newest first
const RELEASES_ENDPOINT: &str = "releases";

/// Endpoint for the most recent release
const LATEST_RELEASE_ENDPOINT: &str = "releases/latest";

/// Release information
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Release tag (e.g., "v0.4.0")
    pub tag_name: String,

    /// Release assets, one per platform artifact
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Release asset
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name
    pub name: String,

    /// Download URL
    #[serde(rename = "browser_download_url")]
    pub download_url: String,

    /// Declared content digest, absent for assets uploaded before the
    /// service started publishing digests
    #[serde(default, deserialize_with = "deserialize_digest")]
    pub digest: Option<AssetDigest>,
}

impl ReleaseAsset {
    /// Whether the asset file name ends with `extension`, ignoring case
    pub fn has_extension(&self, extension: &str) -> bool {
        self.name
            .to_ascii_lowercase()
            .ends_with(&extension.to_ascii_lowercase())
    }
}

/// Client for the release hosting service
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    /// HTTP client
    client: reqwest::Client,

    /// Repository base URL, ending in '/'
    base_url: String,
}

impl ReleaseClient {
    /// Create a client from the runtime configuration
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.network.user_agent)
            .timeout(Duration::from_secs(config.network.http_timeout_secs))
            .build()
            .map_err(|e| UpdateError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, config.releases_base_url()))
    }

    /// Create a client for an explicit base URL
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self { client, base_url }
    }

    /// The repository base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List all releases, newest first
    pub async fn list_releases(&self) -> Result<Vec<Release>> {
        self.get_json(RELEASES_ENDPOINT).await
    }

    /// Get latest release
    pub async fn latest_release(&self) -> Result<Release> {
        self.get_json(LATEST_RELEASE_ENDPOINT).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Fetching release metadata from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| UpdateError::Fetch {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Status { url, status });
        }

        let body = response.text().await.map_err(|source| UpdateError::Fetch {
            url: url.clone(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|source| UpdateError::Parse { url, source })
    }
}
