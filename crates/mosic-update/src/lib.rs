//! Self-update engine for Mosic
//!
//! Provides:
//! - Release lookup against the release hosting service
//! - Content-digest based version identification and update detection
//! - Artifact download with progress reporting and digest verification
//! - Archive installation (zip, tar, tar.gz, bare executables) with
//!   signature-based executable detection
//! - The two-process replacement protocol: the old process relaunches the
//!   new binary and the new process deletes its predecessor

pub mod detector;
pub mod digest;
pub mod download;
pub mod error;
pub mod flow;
pub mod handoff;
pub mod installer;
pub mod releases;
pub mod signature;

pub use detector::{decide, platform_extension, version_tag_for, UpdateDetector};
pub use detector::{AbortReason, UpdateDecision, UpdateOffer, UNKNOWN_VERSION};
pub use digest::{AssetDigest, InstalledBinary, SUPPORTED_DIGEST_ALGORITHM};
pub use download::{DownloadProgress, Downloader};
pub use error::{Result, UpdateError};
pub use flow::{AutoConfirm, LaunchOutcome, LaunchState, ProgressCallback};
pub use flow::{ProcessControl, SystemProcess, UpdateFlow, UpdateNotice, UpdatePrompt};
pub use handoff::{cleanup_predecessor, relaunch_args, CleanupOutcome, CleanupPolicy};
pub use handoff::PendingReplacement;
pub use installer::{ArchiveInstaller, InstallOutcome};
pub use releases::{Release, ReleaseAsset, ReleaseClient};

/// Current CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
