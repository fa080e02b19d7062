//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use geotrail::config::{config_file_path, ConfigFile};
use geotrail::logging::{init_logging, LoggingGuard};
use geotrail::session::SessionStatus;
use geotrail::stats::TrackingStats;
use geotrail::upload::UploadController;

use crate::error::CliError;

/// Resolve the config file path: `--config` wins over the default location.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Result<PathBuf, CliError> {
    match cli_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(config_file_path()?),
    }
}

/// Load the config file, or defaults if it doesn't exist yet.
pub fn load_config(path: &Path) -> Result<ConfigFile, CliError> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    Ok(ConfigFile::load_from(path)?)
}

/// Install logging for commands that run a tracker.
pub fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    Ok(init_logging(&config.logging)?)
}

/// Format a duration as `h:mm:ss` or `m:ss`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Format metres as `m` below one kilometre, `km` above.
pub fn format_distance(metres: f64) -> String {
    if metres < 1000.0 {
        format!("{:.0} m", metres)
    } else {
        format!("{:.2} km", metres / 1000.0)
    }
}

/// Print the end-of-session summary shared by `run` and `simulate`.
pub fn print_summary(controller: &UploadController, status: &SessionStatus, stats: &TrackingStats) {
    let state = controller.state();

    println!();
    println!("Session Summary");
    println!("===============");
    println!("  Ticks:         {} ({} without fix)", status.ticks, status.missed_fixes);
    println!("  Checks:        {}", state.checks);
    println!(
        "  Uploads:       {} ({} failed)",
        state.updates, state.errors
    );
    println!("  Distance:      {}", format_distance(state.total_distance_m));
    println!("  Update ratio:  {:.0}%", stats.update_ratio() * 100.0);
    println!(
        "  Next interval: {}",
        format_duration(state.current_interval)
    );
    if controller.pending_uploads() > 0 {
        println!(
            "  Undelivered:   {} samples still buffered",
            controller.pending_uploads()
        );
    }
}
