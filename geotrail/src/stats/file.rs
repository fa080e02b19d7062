//! File-backed statistics sink.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tokio::runtime::RuntimeFlavor;

use super::{StatisticsSink, StatsError, TrackingStats};

/// Statistics persisted as a JSON document.
///
/// The whole document is rewritten on every record call, via a sibling
/// temp file and a rename, so a crash mid-write leaves the previous version
/// intact.
///
/// Writes are blocking file I/O. When called from a multi-threaded tokio
/// runtime they run under [`tokio::task::block_in_place`] so other tasks on
/// the worker keep making progress; elsewhere they run inline.
#[derive(Debug)]
pub struct FileStatsSink {
    path: PathBuf,
    stats: Mutex<TrackingStats>,
}

impl FileStatsSink {
    /// Open the sink, loading any counters already on disk.
    ///
    /// A missing file starts from zero. A file that exists but can't be
    /// parsed is an error rather than silently reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StatsError> {
        let path = path.into();
        let stats = read_stats(&path)?;
        Ok(Self {
            path,
            stats: Mutex::new(stats),
        })
    }

    /// Location of the statistics file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current counters.
    pub fn snapshot(&self) -> TrackingStats {
        self.stats.lock().clone()
    }

    fn update(&self, apply: impl FnOnce(&mut TrackingStats)) -> Result<(), StatsError> {
        let mut stats = self.stats.lock();
        apply(&mut stats);
        run_blocking(|| write_stats(&self.path, &stats))
    }
}

impl StatisticsSink for FileStatsSink {
    fn load(&self) -> Result<TrackingStats, StatsError> {
        Ok(self.snapshot())
    }

    fn record_check(&self, timestamp_ms: i64, count: u64) -> Result<(), StatsError> {
        self.update(|s| s.apply_check(timestamp_ms, count))
    }

    fn record_update(
        &self,
        timestamp_ms: i64,
        count: u64,
        distance_delta_m: f64,
        total_distance_m: f64,
    ) -> Result<(), StatsError> {
        self.update(|s| s.apply_update(timestamp_ms, count, distance_delta_m, total_distance_m))
    }

    fn record_error(&self, timestamp_ms: i64, count: u64) -> Result<(), StatsError> {
        self.update(|s| s.apply_error(timestamp_ms, count))
    }

    fn reset(&self) -> Result<(), StatsError> {
        self.update(|s| *s = TrackingStats::default())
    }
}

fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn read_stats(path: &Path) -> Result<TrackingStats, StatsError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TrackingStats::default())
        }
        Err(source) => {
            return Err(StatsError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents).map_err(|source| StatsError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_stats(path: &Path, stats: &TrackingStats) -> Result<(), StatsError> {
    let io_err = |source| StatsError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let json = serde_json::to_vec_pretty(stats)?;
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
    }
    fs::rename(&tmp_path, path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let sink = FileStatsSink::open(dir.path().join("stats.json")).unwrap();
        assert_eq!(sink.load().unwrap(), TrackingStats::default());
    }

    #[test]
    fn test_counters_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("stats.json");

        {
            let sink = FileStatsSink::open(&path).unwrap();
            sink.record_check(1_000, 3).unwrap();
            sink.record_update(1_000, 2, 75.0, 180.0).unwrap();
            sink.record_error(2_000, 1).unwrap();
        }

        let reopened = FileStatsSink::open(&path).unwrap();
        let stats = reopened.load().unwrap();
        assert_eq!(stats.checks, 3);
        assert_eq!(stats.updates, 2);
        assert_eq!(stats.total_distance_m, 180.0);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.last_error_ms, Some(2_000));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        let sink = FileStatsSink::open(&path).unwrap();
        sink.record_check(1, 1).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, "{ not json").unwrap();

        let err = FileStatsSink::open(&path).unwrap_err();
        assert!(matches!(err, StatsError::Corrupt { .. }));
    }

    #[test]
    fn test_reset_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        let sink = FileStatsSink::open(&path).unwrap();
        sink.record_check(1, 9).unwrap();
        sink.reset().unwrap();

        let reopened = FileStatsSink::open(&path).unwrap();
        assert_eq!(reopened.snapshot().checks, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_writes_inside_multi_thread_runtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        let sink = FileStatsSink::open(&path).unwrap();

        sink.record_check(1_000, 1).unwrap();
        sink.record_update(1_000, 1, 20.0, 20.0).unwrap();

        assert_eq!(FileStatsSink::open(&path).unwrap().snapshot().updates, 1);
    }

    #[tokio::test]
    async fn test_writes_inside_current_thread_runtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        let sink = FileStatsSink::open(&path).unwrap();

        sink.record_error(5_000, 2).unwrap();

        assert_eq!(FileStatsSink::open(&path).unwrap().snapshot().errors, 2);
    }
}
