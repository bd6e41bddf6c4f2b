//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior like
//! network timeouts, where releases are looked up, and how updates are
//! installed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Release hosting service settings
    #[serde(default)]
    pub releases: ReleasesConfig,

    /// Self-update policy
    #[serde(default)]
    pub update: UpdateConfig,
}

impl RuntimeConfig {
    /// Base URL of the repository's release endpoints, with a trailing slash
    ///
    /// `releases` and `releases/latest` are resolved against it.
    pub fn releases_base_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/",
            self.releases.api_url.trim_end_matches('/'),
            self.releases.repo_owner,
            self.releases.repo_name
        )
    }
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for release metadata requests in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Timeout for artifact downloads in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    60
}
fn default_download_timeout() -> u64 {
    600 // 10 minutes
}
fn default_user_agent() -> String {
    format!(
        "mosic/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Release hosting service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleasesConfig {
    /// Base URL for the release API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Repository owner
    #[serde(default = "default_repo_owner")]
    pub repo_owner: String,

    /// Repository name
    #[serde(default = "default_repo_name")]
    pub repo_name: String,
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            repo_owner: default_repo_owner(),
            repo_name: default_repo_name(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_repo_owner() -> String {
    "Spi3lot".to_string()
}
fn default_repo_name() -> String {
    "Mosic".to_string()
}

/// Self-update configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateConfig {
    /// Asset extension to look for instead of the running executable's own
    /// extension (e.g. ".tar.gz" when the binary ships inside an archive)
    #[serde(default)]
    pub asset_extension: Option<String>,

    /// Directory updates are installed into. Defaults to the directory of
    /// the running executable.
    #[serde(default)]
    pub install_dir: Option<PathBuf>,

    /// Compare the downloaded bytes against the asset's declared digest
    #[serde(default = "default_verify_download_digest")]
    pub verify_download_digest: bool,

    /// Attempts made to delete the predecessor binary after a relaunch
    #[serde(default = "default_cleanup_attempts")]
    pub cleanup_attempts: u32,

    /// Delay between predecessor deletion attempts in milliseconds
    #[serde(default = "default_cleanup_delay")]
    pub cleanup_delay_ms: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            asset_extension: None,
            install_dir: None,
            verify_download_digest: default_verify_download_digest(),
            cleanup_attempts: default_cleanup_attempts(),
            cleanup_delay_ms: default_cleanup_delay(),
        }
    }
}

fn default_verify_download_digest() -> bool {
    true
}
fn default_cleanup_attempts() -> u32 {
    5
}
fn default_cleanup_delay() -> u64 {
    200
}
