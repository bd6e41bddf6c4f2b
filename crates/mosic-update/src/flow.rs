//! Launch-time update orchestration
//!
//! Every launch walks the same state machine:
//!
//! ```text
//! Bootstrapping -> CheckingPredecessorCleanup
//!   replace instruction present -> delete predecessor, start normally
//!   otherwise -> CheckingUpdate
//!     no update / aborted / check failed -> NoUpdate (start normally)
//!     update available -> prompt
//!       declined -> Declined (start normally)
//!       accepted -> Accepted -> Downloading -> Installing
//!         failure -> InstallFailed (start normally)
//!         executable found -> Relaunching
//!           spawn failed -> RelaunchFailed (start normally)
//!           spawned -> Terminated
//! ```
//!
//! User interaction and process control sit behind traits so the whole flow
//! can run against fakes.

use mosic_core::RuntimeConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::detector::{AbortReason, UpdateDecision, UpdateDetector, UNKNOWN_VERSION};
use crate::download::{DownloadProgress, Downloader};
use crate::error::Result;
use crate::handoff::{cleanup_predecessor, relaunch_args, CleanupOutcome, CleanupPolicy};
use crate::handoff::PendingReplacement;
use crate::installer::ArchiveInstaller;

/// Progress callback invoked while the artifact downloads
pub type ProgressCallback = Box<dyn FnMut(&DownloadProgress) + Send>;

/// States of a single launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Bootstrapping,
    CheckingPredecessorCleanup,
    CheckingUpdate,
    NoUpdate,
    Declined,
    Accepted,
    Downloading,
    Installing,
    InstallFailed,
    Relaunching,
    RelaunchFailed,
    Terminated,
}

/// How a launch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// This process is a successor and removed its predecessor
    PredecessorCleaned(CleanupOutcome),

    /// The running binary is the latest release
    UpToDate,

    /// Release metadata could not be acted on
    Aborted(AbortReason),

    /// The release service could not be queried
    CheckFailed(String),

    /// The user declined the offered update
    Declined(UpdateNotice),

    /// The artifact could not be downloaded or verified
    DownloadFailed(String),

    /// The artifact could not be installed or held no executable
    InstallFailed(String),

    /// The new executable could not be started
    RelaunchFailed(String),

    /// The new executable was started and this process should exit
    Relaunched { executable: PathBuf, args: Vec<String> },
}

impl LaunchOutcome {
    /// Whether the application should continue starting in this process
    pub fn continues_startup(&self) -> bool {
        !matches!(self, Self::Relaunched { .. })
    }
}

/// What the user is asked to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    /// Tag of the offered release
    pub latest_tag: String,

    /// Tag of the running binary, or the unknown marker
    pub current_tag: String,

    /// Name of the artifact that will be downloaded
    pub asset_name: String,
}

/// Asks the user whether to install an update
pub trait UpdatePrompt: Send {
    fn confirm(&mut self, notice: &UpdateNotice) -> bool;
}

/// A prompt with a fixed answer, for unattended runs
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl UpdatePrompt for AutoConfirm {
    fn confirm(&mut self, notice: &UpdateNotice) -> bool {
        debug!(
            "Answering update prompt for {} automatically: {}",
            notice.latest_tag, self.0
        );
        self.0
    }
}

/// Starts the successor process and ends the current one
pub trait ProcessControl: Send {
    fn spawn(&mut self, executable: &Path, args: &[String]) -> io::Result<()>;

    fn terminate(&mut self);
}

/// Process control backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl ProcessControl for SystemProcess {
    fn spawn(&mut self, executable: &Path, args: &[String]) -> io::Result<()> {
        let child = Command::new(executable).args(args).spawn()?;
        debug!("Started {:?} as pid {}", executable, child.id());
        Ok(())
    }

    fn terminate(&mut self) {
        std::process::exit(0);
    }
}

/// Drives one launch through cleanup, detection, installation and relaunch
pub struct UpdateFlow<P, C> {
    detector: UpdateDetector,
    downloader: Downloader,
    installer: ArchiveInstaller,
    install_dir: PathBuf,
    verify_digest: bool,
    cleanup: CleanupPolicy,
    prompt: P,
    process: C,
    progress: Option<ProgressCallback>,
    transitions: Vec<LaunchState>,
}

impl<P: UpdatePrompt, C: ProcessControl> UpdateFlow<P, C> {
    /// Create a flow installing next to the running binary
    pub fn new(detector: UpdateDetector, downloader: Downloader, prompt: P, process: C) -> Self {
        let install_dir = detector
            .binary()
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            detector,
            downloader,
            installer: ArchiveInstaller::new(),
            install_dir,
            verify_digest: true,
            cleanup: CleanupPolicy::default(),
            prompt,
            process,
            progress: None,
            transitions: Vec::new(),
        }
    }

    /// Create a flow for the running executable from the runtime configuration
    pub async fn from_config(config: &RuntimeConfig, prompt: P, process: C) -> Result<Self> {
        let detector = UpdateDetector::from_config(config).await?;
        let downloader = Downloader::new(config)?;

        let mut flow = Self::new(detector, downloader, prompt, process)
            .with_digest_verification(config.update.verify_download_digest)
            .with_cleanup_policy(CleanupPolicy::from_config(&config.update));

        if let Some(dir) = &config.update.install_dir {
            flow = flow.with_install_dir(dir.clone());
        }

        Ok(flow)
    }

    /// Install updates into `dir` instead of the binary's directory
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    /// Enable or disable checking downloads against the declared digest
    pub fn with_digest_verification(mut self, verify: bool) -> Self {
        self.verify_digest = verify;
        self
    }

    /// Set how the predecessor binary is deleted
    pub fn with_cleanup_policy(mut self, policy: CleanupPolicy) -> Self {
        self.cleanup = policy;
        self
    }

    /// Report download progress to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Every state entered so far, in order
    pub fn transitions(&self) -> &[LaunchState] {
        &self.transitions
    }

    /// The most recently entered state
    pub fn state(&self) -> Option<LaunchState> {
        self.transitions.last().copied()
    }

    /// The detector used for update checks
    pub fn detector(&self) -> &UpdateDetector {
        &self.detector
    }

    fn enter(&mut self, state: LaunchState) {
        debug!("Launch state: {:?}", state);
        self.transitions.push(state);
    }

    /// Run the launch sequence for the given arguments (without the program name)
    ///
    /// Returns `LaunchOutcome::Relaunched` only after the successor has been
    /// started and `ProcessControl::terminate` was called. Every other
    /// outcome means the application should start normally.
    pub async fn run<S: AsRef<str>>(&mut self, args: &[S]) -> LaunchOutcome {
        self.enter(LaunchState::Bootstrapping);
        self.enter(LaunchState::CheckingPredecessorCleanup);

        if let Some(pending) = PendingReplacement::from_args(args) {
            let outcome =
                cleanup_predecessor(&pending, &self.detector.binary().path, self.cleanup).await;
            return LaunchOutcome::PredecessorCleaned(outcome);
        }

        self.enter(LaunchState::CheckingUpdate);

        let offer = match self.detector.check().await {
            Ok(UpdateDecision::UpdateAvailable(offer)) => offer,
            Ok(UpdateDecision::NoUpdateNeeded) => {
                self.enter(LaunchState::NoUpdate);
                return LaunchOutcome::UpToDate;
            }
            Ok(UpdateDecision::Aborted(reason)) => {
                self.enter(LaunchState::NoUpdate);
                return LaunchOutcome::Aborted(reason);
            }
            Err(e) => {
                warn!("Update check failed: {}", e);
                self.enter(LaunchState::NoUpdate);
                return LaunchOutcome::CheckFailed(e.to_string());
            }
        };

        let current_tag = match self.detector.current_version_tag().await {
            Ok(tag) => tag,
            Err(e) => {
                warn!("Could not determine the running version: {}", e);
                UNKNOWN_VERSION.to_string()
            }
        };

        let notice = UpdateNotice {
            latest_tag: offer.release.tag_name.clone(),
            current_tag,
            asset_name: offer.asset.name.clone(),
        };

        if !self.prompt.confirm(&notice) {
            info!("Update to {} declined", notice.latest_tag);
            self.enter(LaunchState::Declined);
            return LaunchOutcome::Declined(notice);
        }

        self.enter(LaunchState::Accepted);
        self.enter(LaunchState::Downloading);

        let downloaded = {
            let mut ignore = |_: &DownloadProgress| {};
            let on_progress: &mut (dyn FnMut(&DownloadProgress) + Send) =
                match self.progress.as_deref_mut() {
                    Some(callback) => callback,
                    None => &mut ignore,
                };
            self.downloader
                .fetch_asset(&offer.asset, self.verify_digest, on_progress)
                .await
        };

        let bytes = match downloaded {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Update download failed: {}", e);
                self.enter(LaunchState::InstallFailed);
                return LaunchOutcome::DownloadFailed(e.to_string());
            }
        };

        self.enter(LaunchState::Installing);

        let destination = self
            .install_dir
            .join(artifact_file_name(&offer.download_url, &offer.asset.name));

        let executable = match self.installer.install(&destination, &bytes).await {
            Ok(outcome) => match outcome.executable_path {
                Some(path) => path,
                None => {
                    self.enter(LaunchState::InstallFailed);
                    return LaunchOutcome::InstallFailed(format!(
                        "no executable found in {}",
                        offer.asset.name
                    ));
                }
            },
            Err(e) => {
                warn!("Update installation failed: {}", e);
                self.enter(LaunchState::InstallFailed);
                return LaunchOutcome::InstallFailed(e.to_string());
            }
        };

        self.enter(LaunchState::Relaunching);

        let successor_args = relaunch_args(args, &self.detector.binary().path);
        if let Err(e) = self.process.spawn(&executable, &successor_args) {
            warn!("Failed to start {:?}: {}", executable, e);
            self.enter(LaunchState::RelaunchFailed);
            return LaunchOutcome::RelaunchFailed(e.to_string());
        }

        info!("Relaunched as {:?}", executable);
        self.enter(LaunchState::Terminated);
        self.process.terminate();

        LaunchOutcome::Relaunched {
            executable,
            args: successor_args,
        }
    }
}

/// File name of a download URL, falling back to the asset name
fn artifact_file_name(download_url: &str, asset_name: &str) -> String {
    let path = download_url
        .split(['?', '#'])
        .next()
        .unwrap_or(download_url);

    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => asset_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("https://example.com/dl/v2/Mosic.zip", "x"),
            "Mosic.zip"
        );
        assert_eq!(
            artifact_file_name("https://example.com/dl/Mosic.exe?token=1", "x"),
            "Mosic.exe"
        );
        assert_eq!(artifact_file_name("https://example.com/dl/", "Mosic.tar.gz"), "Mosic.tar.gz");
    }

    #[test]
    fn test_only_relaunch_stops_startup() {
        assert!(LaunchOutcome::UpToDate.continues_startup());
        assert!(LaunchOutcome::InstallFailed("x".into()).continues_startup());
        assert!(!LaunchOutcome::Relaunched {
            executable: PathBuf::from("/a"),
            args: vec![],
        }
        .continues_startup());
    }

    #[test]
    fn test_auto_confirm() {
        let notice = UpdateNotice {
            latest_tag: "v2".into(),
            current_tag: "v1".into(),
            asset_name: "Mosic.exe".into(),
        };
        assert!(AutoConfirm(true).confirm(&notice));
        assert!(!AutoConfirm(false).confirm(&notice));
    }
}
