//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Runtime config (~/.mosic/mosic-runtime.yaml)
//! 3. Environment variables (MOSIC_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::RuntimeConfig;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Runtime config file name inside the config directory
const RUNTIME_CONFIG_FILE: &str = "mosic-runtime.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.mosic)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::invalid_config("Could not determine home directory"))?;

        let config_dir = Utf8PathBuf::from(home).join(".mosic");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        Ok(config_dir)
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        let runtime_config_path = self.config_dir.join(RUNTIME_CONFIG_FILE);
        if runtime_config_path.exists() {
            debug!("Loading runtime config from {}", runtime_config_path);
            let file_config = self.load_yaml_file::<RuntimeConfig>(&runtime_config_path)?;
            config = Self::merge_runtime_config(config, file_config);
        }

        config = self.apply_env_overrides(config)?;

        Ok(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Merge two runtime configs (base is overridden by overlay)
    ///
    /// Optional update settings only override when the overlay sets them.
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        let mut update = overlay.update;
        if update.asset_extension.is_none() {
            update.asset_extension = base.update.asset_extension;
        }
        if update.install_dir.is_none() {
            update.install_dir = base.update.install_dir;
        }

        RuntimeConfig {
            network: overlay.network,
            releases: overlay.releases,
            update,
        }
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("MOSIC_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("MOSIC_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("MOSIC_DOWNLOAD_TIMEOUT_SECS") {
            config.network.download_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("MOSIC_DOWNLOAD_TIMEOUT_SECS must be a valid number")
            })?;
        }

        // Release service
        if let Ok(val) = env::var("MOSIC_RELEASES_API_URL") {
            config.releases.api_url = val;
        }

        if let Ok(val) = env::var("MOSIC_REPO_OWNER") {
            config.releases.repo_owner = val;
        }

        if let Ok(val) = env::var("MOSIC_REPO_NAME") {
            config.releases.repo_name = val;
        }

        // Update policy
        if let Ok(val) = env::var("MOSIC_ASSET_EXTENSION") {
            config.update.asset_extension = Some(val);
        }

        if let Ok(val) = env::var("MOSIC_INSTALL_DIR") {
            config.update.install_dir = Some(PathBuf::from(val));
        }

        if let Ok(val) = env::var("MOSIC_VERIFY_DOWNLOAD_DIGEST") {
            config.update.verify_download_digest = val.parse().map_err(|_| {
                Error::invalid_config("MOSIC_VERIFY_DOWNLOAD_DIGEST must be true or false")
            })?;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
