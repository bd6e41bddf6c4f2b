//! Mosic launcher
//!
//! Checks for a newer release on every start, installs it on request and
//! hands over to the new binary, which then deletes the old one.

mod cli;
mod commands;
mod output;
mod prompt;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{split_launch_args, Cli, Commands};
use commands::launch::LaunchOptions;

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before any TLS operation
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let mut raw = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
    let program = raw.next().unwrap_or_else(|| "mosic".to_string());
    let args: Vec<String> = raw.collect();

    // Handoff instructions after `++` are not CLI flags
    let (cli_args, _) = split_launch_args(&args);
    let cli = Cli::parse_from(
        std::iter::once(program.as_str()).chain(cli_args.iter().map(String::as_str)),
    );

    init_tracing(cli.verbose, cli.quiet);

    // The predecessor is removed before anything else, even without a usable config
    let boot = commands::bootstrap(&args, commands::load_config).await;

    match cli.command {
        None => {
            let options = LaunchOptions {
                assume_yes: cli.yes,
                skip_update: cli.no_update,
                quiet: cli.quiet,
            };
            commands::launch::run(options, boot, &args).await;
            Ok(())
        }
        Some(Commands::Check(check)) => commands::check::run(check, &boot.config?).await,
        Some(Commands::Version(version)) => commands::version::run(version, &boot.config?).await,
        Some(Commands::Install(install)) => commands::install::run(install).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
