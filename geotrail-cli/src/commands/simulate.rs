//! Simulate command - deterministic dry run against an in-memory store.
//!
//! Ticks are replayed back to back on a manual clock, so a day-long track
//! finishes instantly. The `--fail` pattern scripts store availability per
//! tick: `o` for up, `x` for down. Ticks past the end of the pattern see the
//! store up.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use geotrail::clock::{Clock, ManualClock};
use geotrail::config::ConfigFile;
use geotrail::session::{feed_reading, SessionStatus, StopReason};
use geotrail::source::{LocationSource, ReplaySource};
use geotrail::stats::{MemoryStatsSink, StatisticsSink};
use geotrail::store::{MemoryStore, RemoteStore};
use geotrail::upload::UploadController;

use super::common::{format_distance, format_duration, print_summary, start_logging};
use crate::error::CliError;

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub track: PathBuf,
    pub fail: String,
}

/// Parse an availability pattern into per-tick `store up` flags.
///
/// Whitespace is ignored so long patterns can be grouped (`"oooo xxxx oo"`).
pub fn parse_pattern(pattern: &str) -> Result<Vec<bool>, CliError> {
    pattern
        .chars()
        .filter(|c| !c.is_whitespace())
        .enumerate()
        .map(|(i, c)| match c {
            'o' | 'O' => Ok(true),
            'x' | 'X' => Ok(false),
            other => Err(CliError::Config(format!(
                "Invalid character '{}' at position {} in --fail pattern (use 'o' or 'x')",
                other,
                i + 1
            ))),
        })
        .collect()
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, config: &ConfigFile) -> Result<(), CliError> {
    let _logging = start_logging(config)?;
    let tracking = config.tracking_config()?;
    let pattern = parse_pattern(&args.fail)?;

    let start = Utc::now();
    let clock = Arc::new(ManualClock::new(start));
    let store = Arc::new(MemoryStore::new());
    let stats = Arc::new(MemoryStatsSink::new());
    let mut source =
        ReplaySource::from_path(&args.track)?.restamped(Arc::clone(&clock) as Arc<dyn Clock>);

    let mut controller = UploadController::new(
        tracking,
        Arc::clone(&store) as Arc<dyn RemoteStore>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&stats) as Arc<dyn StatisticsSink>,
    )?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(CliError::Runtime)?;

    println!(
        "{:>5}  {:>8}  {:<5}  {:<16}  {:>9}  {:>8}  {:>7}",
        "TICK", "ELAPSED", "STORE", "DECISION", "DISTANCE", "DELAY", "PENDING"
    );

    let mut status = SessionStatus::default();
    runtime.block_on(async {
        loop {
            let up = pattern.get(status.ticks as usize).copied().unwrap_or(true);
            store.set_offline(!up);

            let reading = source.next_reading().await;
            let last_known = source.last_known();
            let Some(fed) = feed_reading(&mut controller, reading, last_known).await else {
                break;
            };

            status.ticks += 1;
            if fed.missed_fix {
                status.missed_fixes += 1;
            }
            status.last_tick = controller.last_tick();
            status.pending = controller.pending_uploads();

            let elapsed = format_duration(clock.elapsed_since(start));
            let store_state = if up { "up" } else { "down" };
            match status.last_tick {
                Some(tick) if !(fed.missed_fix && last_known.is_none()) => println!(
                    "{:>5}  {:>8}  {:<5}  {:<16}  {:>9}  {:>8}  {:>7}",
                    status.ticks,
                    elapsed,
                    store_state,
                    tick.decision.to_string(),
                    format_distance(tick.distance_m),
                    format_duration(fed.delay),
                    tick.pending
                ),
                _ => println!(
                    "{:>5}  {:>8}  {:<5}  {:<16}  {:>9}  {:>8}  {:>7}",
                    status.ticks,
                    elapsed,
                    store_state,
                    "no fix",
                    "-",
                    format_duration(fed.delay),
                    status.pending
                ),
            }

            clock.advance(fed.delay);
        }
    });
    status.stopped = Some(StopReason::SourceExhausted);

    print_summary(&controller, &status, &stats.snapshot());
    println!("  Stored:        {} samples", store.len());

    Ok(())
}
