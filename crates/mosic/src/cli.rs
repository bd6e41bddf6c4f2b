//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use mosic_update::handoff::USER_ARG_DELIMITER;
use std::path::PathBuf;

/// Mosic - music downloader with built-in self-update
#[derive(Parser, Debug)]
#[command(name = "mosic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Install available updates without asking
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Skip the update check on startup
    #[arg(long, global = true, env = "MOSIC_NO_UPDATE")]
    pub no_update: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether an update is available
    Check(CheckArgs),

    /// Show the running version as identified by the release history
    Version(VersionArgs),

    /// Install a local update artifact and report the executable found
    Install(InstallArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Artifact to install (zip, tar, tar.gz, tgz or a bare executable)
    pub archive: PathBuf,

    /// Directory to install into (default: the artifact's directory)
    #[arg(short, long)]
    pub dest: Option<PathBuf>,
}

/// Split launch arguments into the part clap parses and the user block
///
/// The user block starts at the first `++` and carries handoff
/// instructions such as `--replace="<path>"`, which clap must not see.
pub fn split_launch_args(args: &[String]) -> (&[String], &[String]) {
    match args.iter().position(|arg| arg == USER_ARG_DELIMITER) {
        Some(index) => args.split_at(index),
        None => (args, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_launch_args() {
        let args = strings(&["check", "++", "--replace=\"/old\""]);
        let (cli, user) = split_launch_args(&args);
        assert_eq!(cli, &strings(&["check"])[..]);
        assert_eq!(user, &strings(&["++", "--replace=\"/old\""])[..]);

        let args = strings(&["-v"]);
        let (cli, user) = split_launch_args(&args);
        assert_eq!(cli.len(), 1);
        assert!(user.is_empty());
    }

    #[test]
    fn test_parse_default_command() {
        let cli = Cli::try_parse_from(["mosic", "--yes", "-vv"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.yes);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_install() {
        let cli = Cli::try_parse_from(["mosic", "install", "Mosic.zip", "--dest", "/tmp/x"]).unwrap();
        match cli.command {
            Some(Commands::Install(args)) => {
                assert_eq!(args.archive, PathBuf::from("Mosic.zip"));
                assert_eq!(args.dest, Some(PathBuf::from("/tmp/x")));
            }
            other => panic!("Expected install command, got {:?}", other),
        }
    }
}
