//! Upstream Claude endpoint configuration.

use serde::Deserialize;

/// Settings for reaching Claude.ai and, optionally, the first-party
/// Anthropic API used for OAuth rate-limit probing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClaudeConfig {
    /// Base URL for the Anthropic Messages API, used by the OAuth
    /// rate-limit prober.
    pub claude_api_baseurl: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            claude_api_baseurl: "https://api.anthropic.com".to_string(),
        }
    }
}
