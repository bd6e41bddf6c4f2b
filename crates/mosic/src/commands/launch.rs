//! Default launch: predecessor cleanup, update check, relaunch

use mosic_core::RuntimeConfig;
use mosic_update::{AutoConfirm, DownloadProgress, LaunchOutcome, SystemProcess, UpdateFlow};
use mosic_update::UpdatePrompt;
use tracing::{info, warn};

use crate::commands::{report_cleanup, Bootstrap};
use crate::output;
use crate::prompt::TerminalPrompt;

/// Global flags that shape the default launch
#[derive(Debug, Clone, Copy)]
pub struct LaunchOptions {
    pub assume_yes: bool,
    pub skip_update: bool,
    pub quiet: bool,
}

/// Run the default launch; failures are reported and startup always continues
pub async fn run(options: LaunchOptions, boot: Bootstrap, args: &[String]) {
    if boot.cleanup.is_some() {
        info!("Relaunched after an update, skipping the update check");
    } else if options.skip_update {
        info!("Update check disabled");
    } else {
        match boot.config {
            Ok(config) if options.assume_yes => {
                drive(&config, AutoConfirm(true), args, options.quiet).await
            }
            Ok(config) => drive(&config, TerminalPrompt, args, options.quiet).await,
            Err(e) => report(&LaunchOutcome::CheckFailed(format!("{:#}", e))),
        }
    }

    info!("Starting Mosic");
}

async fn drive<P: UpdatePrompt>(config: &RuntimeConfig, prompt: P, args: &[String], quiet: bool) {
    let mut flow = match UpdateFlow::from_config(config, prompt, SystemProcess).await {
        Ok(flow) => flow,
        Err(e) => {
            warn!("Update flow setup failed: {}", e);
            report(&LaunchOutcome::CheckFailed(e.to_string()));
            return;
        }
    };

    if !quiet {
        let bar = output::download_bar("Downloading update");
        flow = flow.with_progress(Box::new(move |progress: &DownloadProgress| {
            output::track_download(&bar, progress)
        }));
    }

    let outcome = flow.run(args).await;
    report(&outcome);
}

fn report(outcome: &LaunchOutcome) {
    match outcome {
        LaunchOutcome::PredecessorCleaned(cleanup) => report_cleanup(cleanup),
        LaunchOutcome::UpToDate => output::info("Mosic is up to date"),
        LaunchOutcome::Aborted(reason) => {
            output::warning(&format!("Update check skipped: {}", reason))
        }
        LaunchOutcome::CheckFailed(e) => output::warning(&format!("Update check failed: {}", e)),
        LaunchOutcome::Declined(notice) => {
            output::info(&format!("Staying on {}", notice.current_tag))
        }
        LaunchOutcome::DownloadFailed(e) => output::error(&format!("Update download failed: {}", e)),
        LaunchOutcome::InstallFailed(e) => output::error(&format!("Update install failed: {}", e)),
        LaunchOutcome::RelaunchFailed(e) => {
            output::error(&format!("Could not start the new version: {}", e))
        }
        LaunchOutcome::Relaunched { executable, .. } => {
            output::success(&format!("Relaunched as {}", executable.display()))
        }
    }
}
