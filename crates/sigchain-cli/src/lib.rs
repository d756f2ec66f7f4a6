//! CLI flags and logging bootstrap shared by sigchain binaries.
//!
//! This crate owns nothing about the loader pipeline itself; it only layers
//! `clap`-derived flags over the plain config types in `sigchain-core` and
//! boots a [`tracing_subscriber::Registry`] from them.

mod args;
pub use args::{ConfigArgs, LogArgs};

mod log_config;
pub use log_config::{FileLogConfig, LogConfig, LogRotation, StdoutLogConfig};

pub mod tracing;
pub use crate::tracing::{init_test_tracing, LogFormat};
