//! Terminal output utilities

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use mosic_update::DownloadProgress;
use std::time::Duration;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a byte-counting download bar
pub fn download_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(template) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
    ) {
        pb.set_style(template.progress_chars("#>-"));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Mirror a download progress report onto a bar
pub fn track_download(pb: &ProgressBar, progress: &DownloadProgress) {
    if progress.total_bytes > 0 && pb.length() != Some(progress.total_bytes) {
        pb.set_length(progress.total_bytes);
    }
    pb.set_position(progress.downloaded_bytes);
    if progress.is_complete() {
        pb.finish_and_clear();
    }
}
