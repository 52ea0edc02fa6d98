//! Configuration structures mapping the proxy's TOML configuration file.

#![deny(missing_docs)]

mod accounts;
mod claude;
mod error;
mod loader;
mod request;
mod server;

use std::path::Path;

pub use accounts::AccountsConfig;
pub use claude::ClaudeConfig;
pub use error::Error;
pub use request::RequestConfig;
pub use server::ServerConfig;
use serde::Deserialize;

/// Top-level configuration for the proxy process.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    pub server: ServerConfig,
    /// Account pool configuration settings.
    pub accounts: AccountsConfig,
    /// Request-builder configuration settings.
    pub request: RequestConfig,
    /// Upstream Claude endpoint configuration.
    pub claude: ClaudeConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        loader::load(path)
    }
}
