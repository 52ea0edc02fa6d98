//! Request-builder configuration settings.

use serde::Deserialize;

const DEFAULT_PAD_TOKENS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Settings controlling how an inbound Messages API request is translated
/// into a Claude-web completion payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// Number of random characters prepended to the merged prompt. Zero
    /// disables padding.
    pub padtxt_length: usize,
    /// Character pool padding is sampled from. Falls back to
    /// `[A-Za-z0-9]` when unset.
    pub pad_tokens: Option<String>,
    /// Verbatim string placed into the web payload's `prompt` field.
    pub custom_prompt: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            padtxt_length: 0,
            pad_tokens: None,
            custom_prompt: None,
        }
    }
}

impl RequestConfig {
    /// The effective padding alphabet, falling back to the built-in default.
    pub fn pad_tokens(&self) -> &str {
        self.pad_tokens.as_deref().unwrap_or(DEFAULT_PAD_TOKENS)
    }
}
