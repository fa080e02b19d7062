//! Stats command - show or reset the persisted tracking statistics.

use chrono::{DateTime, Local, Utc};
use console::style;
use geotrail::config::ConfigFile;
use geotrail::stats::{FileStatsSink, StatisticsSink, TrackingStats};

use super::common::format_distance;
use crate::error::CliError;

/// Run the stats command.
pub fn run(reset: bool, config: &ConfigFile) -> Result<(), CliError> {
    let sink = FileStatsSink::open(&config.storage.stats_file)?;

    if reset {
        sink.reset()?;
        println!(
            "{} Statistics reset ({})",
            style("✓").green(),
            sink.path().display()
        );
        return Ok(());
    }

    println!("Tracking Statistics");
    println!("===================");
    println!("{}", style(sink.path().display()).dim());
    println!();
    print_stats(&sink.snapshot());
    Ok(())
}

fn print_stats(stats: &TrackingStats) {
    println!(
        "  Checks:   {:>8}   last {}",
        stats.checks,
        format_time(stats.last_check_ms)
    );
    println!(
        "  Updates:  {:>8}   last {}",
        stats.updates,
        format_time(stats.last_update_ms)
    );
    let errors = if stats.errors > 0 {
        style(stats.errors).red()
    } else {
        style(stats.errors).green()
    };
    println!(
        "  Errors:   {:>8}   last {}",
        errors,
        format_time(stats.last_error_ms)
    );
    println!();
    println!("  Last move:      {}", format_distance(stats.last_distance_m));
    println!("  Total distance: {}", format_distance(stats.total_distance_m));
    println!("  Update ratio:   {:.1}%", stats.update_ratio() * 100.0);
}

/// Render epoch milliseconds in local time, or `never`.
fn format_time(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_time_never() {
        assert_eq!(format_time(None), "never");
    }

    #[test]
    fn test_format_time_renders_date() {
        let rendered = format_time(Some(1_700_000_000_000));
        assert!(rendered.starts_with("2023-11-1"), "got {}", rendered);
    }

    #[test]
    fn test_reset_clears_file() {
        let dir = TempDir::new().unwrap();
        let mut config = ConfigFile::default();
        config.storage.stats_file = dir.path().join("stats.json");

        let sink = FileStatsSink::open(&config.storage.stats_file).unwrap();
        sink.record_check(1_000, 7).unwrap();
        drop(sink);

        run(true, &config).unwrap();
        let reopened = FileStatsSink::open(&config.storage.stats_file).unwrap();
        assert_eq!(reopened.snapshot(), TrackingStats::default());
    }
}
