//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading, saving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value violates a configuration constraint.
    #[error("invalid tracking configuration: {0}")]
    Invalid(String),

    /// A key in the config file could not be parsed.
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A `section.key` name that the config file does not know.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    /// The platform has no configuration directory.
    #[error("could not determine configuration directory")]
    NoConfigDirectory,

    /// Reading the config file failed.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: ini::Error,
    },

    /// Writing the config file failed.
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
