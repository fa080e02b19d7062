//! Run command - replay a track against the remote store in real time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use geotrail::clock::{Clock, SystemClock};
use geotrail::config::ConfigFile;
use geotrail::session::{StopReason, TrackingSession};
use geotrail::source::ReplaySource;
use geotrail::stats::FileStatsSink;
use geotrail::store::HttpStore;
use geotrail::upload::UploadController;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::{format_distance, format_duration, print_summary, start_logging};
use crate::error::CliError;

/// How often the foreground checks whether the session has ended.
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Arguments for the run command.
pub struct RunArgs {
    pub track: PathBuf,
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub live: bool,
}

/// Run the run command.
pub fn run(args: RunArgs, config: &ConfigFile) -> Result<(), CliError> {
    let _logging = start_logging(config)?;
    let tracking = config.tracking_config()?;

    // Endpoint and token: CLI > config
    let endpoint = args
        .endpoint
        .or_else(|| config.remote.endpoint.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No remote endpoint. Set remote.endpoint in config.ini or use --endpoint"
                    .to_string(),
            )
        })?;
    let mut store = HttpStore::with_timeout(
        endpoint,
        Duration::from_secs(config.remote.timeout_secs),
    )?;
    if let Some(token) = args.token.or_else(|| config.remote.token.clone()) {
        store = store.with_token(token);
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut source = ReplaySource::from_path(&args.track)?;
    if args.live {
        source = source.restamped(Arc::clone(&clock));
    }
    let stats = Arc::new(FileStatsSink::open(&config.storage.stats_file)?);

    println!("Geotrail Tracker v{}", geotrail::VERSION);
    println!("========================");
    println!();
    println!("Track:      {} ({} readings)", args.track.display(), source.remaining());
    println!("Endpoint:   {}", store.base_url());
    println!(
        "Interval:   {} - {}",
        format_duration(tracking.min_interval),
        format_duration(tracking.max_interval)
    );
    println!("Threshold:  {}", format_distance(tracking.distance_threshold_m));
    println!("Statistics: {}", stats.path().display());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let controller = UploadController::new(tracking, Arc::new(store), clock, stats.clone())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let handle = TrackingSession::start(controller, source, runtime.handle());

    // Set up signal handler for graceful shutdown
    let shutdown: CancellationToken = handle.cancellation_token();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, finishing current upload...");
        shutdown.cancel();
    })?;

    let (controller, status) = runtime.block_on(async move {
        while !handle.is_finished() {
            tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        }
        let status = handle.status();
        handle.join().await.map(|controller| (controller, status))
    })?;

    match status.stopped {
        Some(StopReason::SourceExhausted) => println!("Track finished."),
        _ => println!("Tracking stopped."),
    }
    info!(ticks = status.ticks, "Run complete");
    print_summary(&controller, &status, &stats.snapshot());

    Ok(())
}
