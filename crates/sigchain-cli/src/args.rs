//! `clap`-derived flag structs layered over the plain [`LogConfig`] and
//! [`sigchain_core::Config`] types, the way the teacher layers CLI flags over
//! a plain config struct rather than making the config struct itself
//! `clap`-aware.

use std::path::PathBuf;
use std::time::Duration;

use sigchain_core::Config;

use crate::{FileLogConfig, LogConfig, LogFormat, LogRotation, StdoutLogConfig};

/// Logging flags shared by every sigchain binary.
#[derive(Debug, Clone, clap::Args)]
pub struct LogArgs {
    /// Minimum log level, absent an `RUST_LOG` override.
    #[arg(long = "log-level", env = "SIGCHAIN_LOG_LEVEL", default_value = "info")]
    pub level: tracing::Level,

    /// Output format for the stdout layer.
    #[arg(long = "log-format", default_value = "full")]
    pub format: LogFormat,

    /// Disables the stdout log layer entirely.
    #[arg(long = "no-stdout-logs")]
    pub no_stdout_logs: bool,

    /// Directory to write rolling log files into. Omitting this disables
    /// file logging.
    #[arg(long = "log-dir", env = "SIGCHAIN_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Rollover cadence for the file log layer.
    #[arg(long = "log-rotation", default_value = "daily")]
    pub log_rotation: LogRotation,
}

impl From<LogArgs> for LogConfig {
    fn from(args: LogArgs) -> Self {
        let stdout_logs =
            (!args.no_stdout_logs).then_some(StdoutLogConfig { format: args.format });
        let file_logs = args.log_dir.map(|directory_path| FileLogConfig {
            directory_path,
            rotation: args.log_rotation,
            format: args.format,
        });

        Self {
            global_level: tracing_subscriber::filter::LevelFilter::from_level(args.level),
            file_logs,
            stdout_logs,
        }
    }
}

/// Loader configuration flags, overlaying [`sigchain_core::Config`].
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Seconds of slack granted to the server before a stale chain is
    /// reported (spec's `SERVER_UPDATE_LAG`).
    #[arg(long = "server-update-lag-secs", env = "SIGCHAIN_SERVER_UPDATE_LAG_SECS")]
    pub server_update_lag_secs: Option<u64>,

    /// Key-state cache format version; bumping this invalidates every
    /// cached [`sigchain_types::CkiCache`].
    #[arg(long = "cki-version", env = "SIGCHAIN_CKI_VERSION")]
    pub cki_version: Option<u32>,

    /// Directory the `RocksLocalStore` opens its column families in.
    #[arg(long = "store-path", env = "SIGCHAIN_STORE_PATH")]
    pub store_path: PathBuf,
}

impl ConfigArgs {
    /// Builds a [`Config`], falling back to its defaults for any flag the
    /// caller left unset.
    pub fn build(&self) -> Config {
        let mut config = Config::default();
        if let Some(secs) = self.server_update_lag_secs {
            config.server_update_lag = Duration::from_secs(secs);
        }
        if let Some(version) = self.cki_version {
            config.cki_version = version;
        }
        config
    }
}
