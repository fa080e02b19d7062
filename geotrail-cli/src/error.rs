//! CLI error type.

use std::fmt;

use geotrail::config::ConfigError;
use geotrail::logging::LoggingError;
use geotrail::session::SessionError;
use geotrail::source::SourceError;
use geotrail::stats::StatsError;
use geotrail::store::StoreError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Bad or missing configuration, including invalid arguments.
    Config(String),
    /// The track file could not be loaded.
    Track(SourceError),
    /// The remote store could not be set up.
    Store(StoreError),
    /// The statistics file could not be read or written.
    Stats(StatsError),
    /// Logging could not be initialized.
    Logging(LoggingError),
    /// The async runtime could not be started.
    Runtime(std::io::Error),
    /// The tracking task failed.
    Session(SessionError),
    /// The Ctrl+C handler could not be installed.
    Signal(ctrlc::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Track(e) => write!(f, "Track error: {}", e),
            CliError::Store(e) => write!(f, "Remote store error: {}", e),
            CliError::Stats(e) => write!(f, "Statistics error: {}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Session(e) => write!(f, "Session error: {}", e),
            CliError::Signal(e) => write!(f, "Failed to set signal handler: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Track(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Stats(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Signal(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        CliError::Track(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<StatsError> for CliError {
    fn from(e: StatsError) -> Self {
        CliError::Stats(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<ctrlc::Error> for CliError {
    fn from(e: ctrlc::Error) -> Self {
        CliError::Signal(e)
    }
}
