//! Update detection by content digest
//!
//! The running binary never carries a version string. It names its own
//! version by finding a published asset with the same digest, and an update
//! exists whenever the latest release's asset for this platform has a
//! different digest.

use mosic_core::RuntimeConfig;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::digest::InstalledBinary;
use crate::error::Result;
use crate::releases::{Release, ReleaseAsset, ReleaseClient};

/// Version reported when no published asset matches the running binary
pub const UNKNOWN_VERSION: &str = "unknown";

/// Outcome of comparing the latest release against the running binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    /// The running binary is the latest release's artifact
    NoUpdateNeeded,

    /// The latest release carries a different artifact for this platform
    UpdateAvailable(UpdateOffer),

    /// The release metadata cannot be acted on
    Aborted(AbortReason),
}

/// An update that can be downloaded and installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOffer {
    /// The release the asset belongs to
    pub release: Release,

    /// The asset matching this platform
    pub asset: ReleaseAsset,

    /// Where to download the asset from
    pub download_url: String,
}

/// Why an update check could not reach a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// No asset has the platform's artifact extension
    NoMatchingAsset { extension: String },

    /// The matching asset's digest uses an algorithm other than SHA-256
    UnsupportedAlgorithm { algorithm: String },

    /// The matching asset has no declared digest
    MissingDigest { asset: String },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatchingAsset { extension } if extension.is_empty() => {
                write!(f, "no matching asset without a file extension")
            }
            Self::NoMatchingAsset { extension } => {
                write!(f, "no matching asset with extension '{}'", extension)
            }
            Self::UnsupportedAlgorithm { algorithm } => {
                write!(f, "unknown hash algorithm '{}'", algorithm)
            }
            Self::MissingDigest { asset } => write!(f, "asset '{}' has no digest", asset),
        }
    }
}

/// The artifact extension of an executable path, including the leading dot
///
/// Returns an empty string for executables without an extension.
pub fn platform_extension(executable: &Path) -> String {
    executable
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Find the asset packaged the same way as the running binary
///
/// An empty extension selects assets whose name has no extension at all.
fn asset_for_extension<'a>(release: &'a Release, extension: &str) -> Option<&'a ReleaseAsset> {
    if extension.is_empty() {
        release
            .assets
            .iter()
            .find(|asset| Path::new(&asset.name).extension().is_none())
    } else {
        release
            .assets
            .iter()
            .find(|asset| asset.has_extension(extension))
    }
}

/// Decide whether `latest` is an update for a binary with `running_digest`
pub fn decide(latest: &Release, running_digest: &str, platform_extension: &str) -> UpdateDecision {
    let Some(asset) = asset_for_extension(latest, platform_extension) else {
        return UpdateDecision::Aborted(AbortReason::NoMatchingAsset {
            extension: platform_extension.to_string(),
        });
    };

    let Some(digest) = &asset.digest else {
        return UpdateDecision::Aborted(AbortReason::MissingDigest {
            asset: asset.name.clone(),
        });
    };

    if !digest.is_supported() {
        return UpdateDecision::Aborted(AbortReason::UnsupportedAlgorithm {
            algorithm: digest.algorithm.clone(),
        });
    }

    if digest.matches(running_digest) {
        return UpdateDecision::NoUpdateNeeded;
    }

    UpdateDecision::UpdateAvailable(UpdateOffer {
        release: latest.clone(),
        asset: asset.clone(),
        download_url: asset.download_url.clone(),
    })
}

/// Name the release whose assets contain `running_digest`
///
/// Releases are scanned in the given (newest-first) order, so the newest
/// release containing the artifact wins.
pub fn version_tag_for(releases: &[Release], running_digest: &str) -> String {
    for release in releases {
        for asset in &release.assets {
            let Some(digest) = &asset.digest else {
                continue;
            };

            if !digest.is_supported() {
                warn!(
                    "Unknown hash algorithm '{}' on asset {} of {}",
                    digest.algorithm, asset.name, release.tag_name
                );
                continue;
            }

            if digest.matches(running_digest) {
                return release.tag_name.clone();
            }
        }
    }

    UNKNOWN_VERSION.to_string()
}

/// Update detector for the running binary
#[derive(Debug, Clone)]
pub struct UpdateDetector {
    client: ReleaseClient,
    binary: InstalledBinary,
    extension: String,
}

impl UpdateDetector {
    /// Create a detector for an explicit binary and artifact extension
    pub fn new(client: ReleaseClient, binary: InstalledBinary, extension: impl Into<String>) -> Self {
        Self {
            client,
            binary,
            extension: extension.into(),
        }
    }

    /// Create a detector for the running executable
    ///
    /// The artifact extension comes from `update.asset-extension` when set,
    /// otherwise from the executable's own file name.
    pub async fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let client = ReleaseClient::new(config)?;
        let binary = InstalledBinary::current().await?;
        let extension = config
            .update
            .asset_extension
            .clone()
            .unwrap_or_else(|| platform_extension(&binary.path));

        debug!(
            "Update detector initialized: path={:?}, extension={:?}",
            binary.path, extension
        );

        Ok(Self::new(client, binary, extension))
    }

    /// The running binary
    pub fn binary(&self) -> &InstalledBinary {
        &self.binary
    }

    /// The artifact extension assets are matched against
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The release client
    pub fn client(&self) -> &ReleaseClient {
        &self.client
    }

    /// Name the running version from the release history
    pub async fn current_version_tag(&self) -> Result<String> {
        let releases = self.client.list_releases().await?;
        let tag = version_tag_for(&releases, &self.binary.content_digest);
        debug!("Running binary identified as {}", tag);
        Ok(tag)
    }

    /// Compare the latest release against the running binary
    pub async fn check(&self) -> Result<UpdateDecision> {
        let latest = self.client.latest_release().await?;
        let decision = decide(&latest, &self.binary.content_digest, &self.extension);

        match &decision {
            UpdateDecision::NoUpdateNeeded => {
                debug!("Already on the latest release: {}", latest.tag_name)
            }
            UpdateDecision::UpdateAvailable(offer) => {
                info!(
                    "Update available: {} ({})",
                    offer.release.tag_name, offer.asset.name
                )
            }
            UpdateDecision::Aborted(reason) => {
                warn!("Update check aborted for {}: {}", latest.tag_name, reason)
            }
        }

        Ok(decision)
    }
}
