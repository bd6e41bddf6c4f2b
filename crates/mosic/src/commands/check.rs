//! Check command

use anyhow::Result;
use mosic_core::RuntimeConfig;
use mosic_update::{UpdateDecision, UpdateDetector, UNKNOWN_VERSION};
use serde_json::json;
use tracing::warn;

use crate::cli::CheckArgs;
use crate::output;

pub async fn run(args: CheckArgs, config: &RuntimeConfig) -> Result<()> {
    let detector = UpdateDetector::from_config(config).await?;

    let spinner = output::spinner("Checking for updates...");
    let decision = detector.check().await;
    let current = detector.current_version_tag().await;
    spinner.finish_and_clear();

    let decision = decision?;
    let current = current.unwrap_or_else(|e| {
        warn!("Could not determine the running version: {}", e);
        UNKNOWN_VERSION.to_string()
    });

    if args.json {
        let body = match &decision {
            UpdateDecision::NoUpdateNeeded => json!({
                "current": current,
                "status": "up-to-date",
            }),
            UpdateDecision::UpdateAvailable(offer) => json!({
                "current": current,
                "status": "update-available",
                "latest": offer.release.tag_name,
                "asset": offer.asset.name,
                "download_url": offer.download_url,
            }),
            UpdateDecision::Aborted(reason) => json!({
                "current": current,
                "status": "aborted",
                "reason": reason.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    output::info(&format!("Current version: {}", current));
    match decision {
        UpdateDecision::NoUpdateNeeded => output::success("Already on the latest version"),
        UpdateDecision::UpdateAvailable(offer) => {
            output::success(&format!("Update available: {}", offer.release.tag_name));
            output::kv("Asset", &offer.asset.name);
            output::kv("URL", &offer.download_url);
            output::info("Run 'mosic' to install the update");
        }
        UpdateDecision::Aborted(reason) => {
            output::warning(&format!("Cannot decide on an update: {}", reason))
        }
    }

    Ok(())
}
