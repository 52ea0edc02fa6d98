//! Account pool configuration settings.

use std::path::PathBuf;

use serde::Deserialize;

/// Settings governing the process-wide account pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccountsConfig {
    /// Maximum number of concurrent sessions a single account may back.
    pub max_sessions_per_cookie: usize,
    /// Interval between background pool maintenance ticks (rate-limit
    /// recovery sweep, OAuth token refresh).
    #[serde(deserialize_with = "duration_str::deserialize_duration")]
    pub account_task_interval: std::time::Duration,
    /// Directory holding `accounts.json`.
    pub data_folder: PathBuf,
    /// When set, the pool never reads or writes `accounts.json`.
    pub no_filesystem_mode: bool,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_cookie: 3,
            account_task_interval: std::time::Duration::from_secs(60),
            data_folder: PathBuf::from("./data"),
            no_filesystem_mode: false,
        }
    }
}

impl AccountsConfig {
    /// Full path to the persisted account store.
    pub fn accounts_file(&self) -> PathBuf {
        self.data_folder.join("accounts.json")
    }
}
