//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// A reverse proxy that fronts a pool of Claude.ai accounts with an
/// Anthropic Messages API-compatible interface.
#[derive(Debug, Parser)]
#[command(name = "clove", version, about)]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "clove.toml")]
    pub config: PathBuf,

    /// Log filter, e.g. `"info"` or `"clove=debug,accounts=debug"`.
    #[arg(long, env = "CLOVE_LOG", default_value = "info")]
    pub log_filter: String,
}
