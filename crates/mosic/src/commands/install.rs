//! Install command

use anyhow::{bail, Context, Result};
use mosic_update::ArchiveInstaller;

use crate::cli::InstallArgs;
use crate::output;

pub async fn run(args: InstallArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.archive)
        .await
        .with_context(|| format!("Failed to read {}", args.archive.display()))?;

    let destination = match &args.dest {
        Some(dir) => {
            let name = args
                .archive
                .file_name()
                .with_context(|| format!("{} has no file name", args.archive.display()))?;
            dir.join(name)
        }
        None => args.archive.clone(),
    };

    let spinner = output::spinner(&format!("Installing {}...", destination.display()));
    let outcome = ArchiveInstaller::new().install(&destination, &bytes).await;
    spinner.finish_and_clear();

    match outcome?.executable_path {
        Some(path) => {
            output::success("Installed");
            output::kv("Executable", &path.display().to_string());
            Ok(())
        }
        None => bail!("No executable found in {}", args.archive.display()),
    }
}
