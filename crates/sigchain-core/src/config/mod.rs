//! Loader configuration.

use sigchain_types::COMPUTED_KEY_INFOS_VERSION_CURRENT;
use std::time::Duration;

/// Default value for [`Config::server_update_lag`]: the window during which
/// a local overlay (spec.md §4.8) is trusted ahead of a server load.
pub const DEFAULT_SERVER_UPDATE_LAG: Duration = Duration::from_secs(20);

/// Runtime configuration for the loader pipeline (spec.md §6
/// "Configuration").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Seconds after a [`crate::overlay::LocalAction::Bump`] during which the
    /// local overlay is trusted over a cached-loaded chain.
    pub server_update_lag: Duration,

    /// Version stamp compared against a cached CKI's own version; a
    /// mismatch marks the cache stale. Defaults to
    /// [`COMPUTED_KEY_INFOS_VERSION_CURRENT`].
    pub cki_version: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_update_lag: DEFAULT_SERVER_UPDATE_LAG,
            cki_version: COMPUTED_KEY_INFOS_VERSION_CURRENT,
        }
    }
}
