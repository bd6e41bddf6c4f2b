//! Command implementations

pub mod check;
pub mod install;
pub mod launch;
pub mod version;

use anyhow::{Context, Result};
use mosic_core::{HierarchicalConfigLoader, RuntimeConfig};
use mosic_update::{cleanup_predecessor, CleanupOutcome, CleanupPolicy, InstalledBinary};
use mosic_update::PendingReplacement;
use tracing::warn;

use crate::output;

/// Load the runtime configuration from defaults, user file and environment
pub fn load_config() -> Result<RuntimeConfig> {
    let loader = HierarchicalConfigLoader::new().context("Failed to locate configuration")?;
    loader
        .load_runtime_config()
        .context("Failed to load runtime configuration")
}

/// Startup state gathered before any command runs
pub struct Bootstrap {
    /// The runtime configuration, or why it could not be loaded
    pub config: Result<RuntimeConfig>,

    /// Result of deleting the predecessor, if this launch was told to
    pub cleanup: Option<CleanupOutcome>,
}

/// Load the configuration and delete a predecessor named in the arguments
///
/// Cleanup never depends on the configuration loading: a broken config only
/// falls back to the default cleanup policy.
pub async fn bootstrap<F>(args: &[String], load: F) -> Bootstrap
where
    F: FnOnce() -> Result<RuntimeConfig>,
{
    let config = load();
    let policy = match &config {
        Ok(config) => CleanupPolicy::from_config(&config.update),
        Err(e) => {
            warn!("Using default cleanup policy: {:#}", e);
            CleanupPolicy::default()
        }
    };

    let cleanup = cleanup_on_start(policy, args).await;
    if let Some(outcome) = &cleanup {
        report_cleanup(outcome);
    }

    Bootstrap { config, cleanup }
}

/// Delete a predecessor named in the launch arguments, if any
async fn cleanup_on_start(policy: CleanupPolicy, args: &[String]) -> Option<CleanupOutcome> {
    let pending = PendingReplacement::from_args(args)?;

    let current = match std::env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            warn!(
                "Cannot locate the running executable, leaving {:?} in place: {}",
                pending.predecessor_path, e
            );
            return None;
        }
    };

    Some(cleanup_predecessor(&pending, &current, policy).await)
}

/// Print the result of a predecessor cleanup
pub fn report_cleanup(outcome: &CleanupOutcome) {
    match outcome {
        CleanupOutcome::Deleted(path) => {
            output::success(&format!("Removed previous version {}", path.display()))
        }
        CleanupOutcome::AlreadyGone(_) | CleanupOutcome::Skipped(_) => {}
        CleanupOutcome::Failed { path, error } => output::warning(&format!(
            "Could not remove previous version {}: {}",
            path.display(),
            error
        )),
    }
}

/// Hash the running executable
pub async fn running_binary() -> Result<InstalledBinary> {
    InstalledBinary::current()
        .await
        .context("Failed to hash the running executable")
}
