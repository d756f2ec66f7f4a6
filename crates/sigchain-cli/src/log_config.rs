//! Plain logging configuration, constructed directly or from [`LogArgs`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

use crate::LogFormat;

/// How often a file-backed log appender rolls over to a new file.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    /// The default: one file per day.
    #[default]
    Daily,
    Never,
}

/// Settings for the file-backed log layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLogConfig {
    /// Directory the rolling appender writes into.
    pub directory_path: PathBuf,
    /// Rollover cadence.
    pub rotation: LogRotation,
    /// Output format for this layer.
    pub format: LogFormat,
}

/// Settings for the stdout log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdoutLogConfig {
    /// Output format for this layer.
    pub format: LogFormat,
}

/// Top-level logging configuration consumed by
/// [`crate::tracing::init_tracing_subscriber`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level emitted by either layer, absent an `RUST_LOG` override.
    #[serde(with = "level_filter_serde")]
    pub global_level: LevelFilter,
    /// File appender layer; absent disables file logging.
    pub file_logs: Option<FileLogConfig>,
    /// Stdout layer; absent disables stdout logging.
    pub stdout_logs: Option<StdoutLogConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global_level: LevelFilter::INFO,
            file_logs: None,
            stdout_logs: Some(StdoutLogConfig::default()),
        }
    }
}

mod level_filter_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use tracing_subscriber::filter::LevelFilter;

    pub(super) fn serialize<S: Serializer>(
        level: &LevelFilter,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        level.to_string().serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<LevelFilter, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
