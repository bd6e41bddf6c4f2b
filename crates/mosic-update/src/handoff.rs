//! Two-process handoff through launch arguments
//!
//! A running executable cannot reliably delete or overwrite its own file, so
//! the process that installed an update relaunches the new binary with an
//! instruction to delete the old one:
//!
//! ```text
//! <new binary> <original args...> ++ --replace="/path/to/old/binary"
//! ```
//!
//! Everything after the `++` delimiter is a user argument in `key=value`
//! form. The successor reads the instruction on startup and deletes the
//! predecessor's file before doing anything else. Nothing is persisted
//! besides the arguments themselves.

use mosic_core::types::UpdateConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Token separating normal arguments from user arguments
pub const USER_ARG_DELIMITER: &str = "++";

/// User argument naming the predecessor binary to delete
pub const REPLACE_KEY: &str = "--replace";

/// Format a user argument, quoting its value
pub fn user_arg(key: &str, value: &str) -> String {
    format!("{}=\"{}\"", key, value)
}

/// The user arguments following the first delimiter
///
/// Further delimiter tokens are ignored, so argument lists that already
/// carried a user block stay readable.
pub fn user_args<S: AsRef<str>>(args: &[S]) -> Vec<&str> {
    args.iter()
        .map(AsRef::as_ref)
        .skip_while(|arg| *arg != USER_ARG_DELIMITER)
        .filter(|arg| *arg != USER_ARG_DELIMITER)
        .collect()
}

/// Split a `key=value` user argument, removing quotes around the value
pub fn parse_user_arg(entry: &str) -> Option<(&str, &str)> {
    let (key, value) = entry.split_once('=')?;
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some((key, value))
}

/// Instruction for the next launch to delete its predecessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReplacement {
    /// The executable file left behind by the previous process
    pub predecessor_path: PathBuf,
}

impl PendingReplacement {
    /// Create an instruction for `predecessor_path`
    pub fn new(predecessor_path: impl Into<PathBuf>) -> Self {
        Self {
            predecessor_path: predecessor_path.into(),
        }
    }

    /// Find a replace instruction among launch arguments
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        user_args(args)
            .into_iter()
            .filter_map(parse_user_arg)
            .find(|(key, value)| *key == REPLACE_KEY && !value.is_empty())
            .map(|(_, value)| Self::new(value))
    }

    /// The user argument carrying this instruction
    pub fn to_user_arg(&self) -> String {
        user_arg(REPLACE_KEY, &self.predecessor_path.to_string_lossy())
    }
}

/// Arguments for the successor process
///
/// The original arguments are kept as-is and followed by the delimiter and
/// the replace instruction for `predecessor`.
pub fn relaunch_args<S: AsRef<str>>(original: &[S], predecessor: &Path) -> Vec<String> {
    let mut args: Vec<String> = original.iter().map(|a| a.as_ref().to_string()).collect();
    args.push(USER_ARG_DELIMITER.to_string());
    args.push(PendingReplacement::new(predecessor).to_user_arg());
    args
}

/// Result of deleting the predecessor binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The file was deleted
    Deleted(PathBuf),

    /// The file no longer existed
    AlreadyGone(PathBuf),

    /// The path is the running executable itself and was left alone
    Skipped(PathBuf),

    /// Every attempt failed; the leftover file stays on disk
    Failed { path: PathBuf, error: String },
}

/// How hard to try deleting the predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// Number of deletion attempts, at least one is always made
    pub attempts: u32,

    /// Delay between attempts
    pub delay: Duration,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(200),
        }
    }
}

impl CleanupPolicy {
    /// Cleanup settings from the update configuration
    pub fn from_config(config: &UpdateConfig) -> Self {
        Self {
            attempts: config.cleanup_attempts,
            delay: Duration::from_millis(config.cleanup_delay_ms),
        }
    }
}

/// Delete the predecessor binary, best-effort
///
/// The predecessor may still be shutting down and hold its file open on some
/// platforms, so deletion is retried a few times. A missing file is not an
/// error, which makes repeated cleanup of the same path harmless. Failures
/// are logged and reported, never raised.
pub async fn cleanup_predecessor(
    pending: &PendingReplacement,
    current_exe: &Path,
    policy: CleanupPolicy,
) -> CleanupOutcome {
    let path = &pending.predecessor_path;

    if path == current_exe {
        warn!("Replace instruction names the running executable {:?}, ignoring", path);
        return CleanupOutcome::Skipped(path.clone());
    }

    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!("Deleted old version at {:?}", path);
                return CleanupOutcome::Deleted(path.clone());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Old version at {:?} is already gone", path);
                return CleanupOutcome::AlreadyGone(path.clone());
            }
            Err(e) if attempt >= attempts => {
                warn!("Failed to delete old version at {:?}: {}", path, e);
                return CleanupOutcome::Failed {
                    path: path.clone(),
                    error: e.to_string(),
                };
            }
            Err(e) => {
                debug!(
                    "Attempt {}/{} to delete {:?} failed: {}",
                    attempt, attempts, path, e
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}
