//! Interactive update confirmation

use console::style;
use dialoguer::Confirm;
use mosic_update::{UpdateNotice, UpdatePrompt};
use tracing::warn;

/// Asks on the terminal before installing an update
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl UpdatePrompt for TerminalPrompt {
    fn confirm(&mut self, notice: &UpdateNotice) -> bool {
        let question = format!(
            "Update available: {} -> {} ({}). Install now?",
            style(&notice.current_tag).dim(),
            style(&notice.latest_tag).green().bold(),
            notice.asset_name
        );

        match Confirm::new().with_prompt(question).default(true).interact() {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Update prompt unavailable, skipping update: {}", e);
                false
            }
        }
    }
}
