//! Version command

use anyhow::Result;
use mosic_core::RuntimeConfig;
use mosic_update::{ReleaseClient, UpdateDetector, UNKNOWN_VERSION, VERSION};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::cli::VersionArgs;
use crate::commands::running_binary;
use crate::output;

/// Version information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Crate version the binary was built from
    pub version: String,

    /// Release tag whose asset matches the running binary
    pub release: String,

    /// SHA-256 of the running binary
    pub digest: String,
}

impl VersionInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!("mosic {} ({})", self.version, self.release)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

pub async fn run(args: VersionArgs, config: &RuntimeConfig) -> Result<()> {
    let binary = running_binary().await?;
    let digest = binary.content_digest.clone();
    let detector = UpdateDetector::new(ReleaseClient::new(config)?, binary, "");

    let release = match detector.current_version_tag().await {
        Ok(tag) => tag,
        Err(e) => {
            warn!("Could not query release history: {}", e);
            UNKNOWN_VERSION.to_string()
        }
    };

    let info = VersionInfo {
        version: VERSION.to_string(),
        release,
        digest,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info);
        output::kv("SHA-256", &info.digest);
    }

    Ok(())
}
