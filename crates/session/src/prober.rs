//! Concrete [`RateLimitProber`] implementation (component C7, spec §4.7).

use std::sync::Arc;

use accounts::{OAuthToken, ProbeOutcome, RateLimitProber};
use async_trait::async_trait;
use futures_util::StreamExt;
use jiff::Timestamp;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::model::{Attachment, ClaudeWebRequest};
use crate::session::Session;

const PROBE_MODEL: &str = "claude-sonnet-4-20250514";

/// Probes the Anthropic API (OAuth path) and, generically over any
/// [`Session`] implementation, a throwaway Claude-web conversation (cookie
/// path), per spec §4.7.
pub struct HttpRateLimitProber {
    client: reqwest::Client,
    claude_api_baseurl: String,
    session_factory: Arc<dyn Fn(&SecretString) -> Arc<dyn Session> + Send + Sync>,
}

impl HttpRateLimitProber {
    /// Builds a prober against `claude_api_baseurl`, using `session_factory`
    /// to open a throwaway cookie-backed session for the cookie-path probe.
    pub fn new(
        claude_api_baseurl: String,
        session_factory: Arc<dyn Fn(&SecretString) -> Arc<dyn Session> + Send + Sync>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            claude_api_baseurl,
            session_factory,
        }
    }

    /// Parses `anthropic-ratelimit-unified-reset` as an ISO-8601 instant.
    /// Only values ending in a literal `Z` are accepted, matching the header
    /// Claude-web actually sends; anything else is silently ignored rather
    /// than guessed at (spec §4.7, §9).
    fn parse_resets_at(headers: &reqwest::header::HeaderMap) -> Option<Timestamp> {
        let raw = headers.get("anthropic-ratelimit-unified-reset")?.to_str().ok()?;
        if !raw.ends_with('Z') {
            return None;
        }
        raw.parse::<Timestamp>().ok()
    }
}

#[async_trait]
impl RateLimitProber for HttpRateLimitProber {
    async fn probe_oauth(&self, token: &OAuthToken) -> ProbeOutcome {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.claude_api_baseurl))
            .bearer_auth(token.access_token.expose_secret())
            .header("anthropic-beta", "oauth-2025-04-20")
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": PROBE_MODEL,
                "max_tokens": 1,
                "messages": [{"role": "user", "content": "hi"}],
            }))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => ProbeOutcome::Valid,
            Ok(response) if response.status().as_u16() == 429 => {
                let resets_at = Self::parse_resets_at(response.headers());
                ProbeOutcome::RateLimited { resets_at }
            }
            Ok(response) => {
                log::warn!("OAuth rate-limit probe returned unexpected status {}", response.status());
                ProbeOutcome::Error
            }
            Err(err) => {
                log::warn!("OAuth rate-limit probe failed: {err}");
                ProbeOutcome::Error
            }
        }
    }

    async fn probe_cookie(&self, cookie: &SecretString) -> ProbeOutcome {
        let session = (self.session_factory)(cookie);

        if let Err(err) = session.ensure_conversation_initialized().await {
            log::warn!("Cookie rate-limit probe failed to initialize conversation: {err}");
            return ProbeOutcome::Error;
        }

        let request = ClaudeWebRequest {
            max_tokens_to_sample: 1,
            attachments: vec![Attachment::from_text("hi")],
            files: vec![],
            model: PROBE_MODEL.to_string(),
            rendering_mode: "messages".to_string(),
            prompt: String::new(),
            timezone: "UTC".to_string(),
            tools: vec![],
        };

        let mut stream = match session.send_message(request).await {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("Cookie rate-limit probe send failed: {err}");
                return ProbeOutcome::Error;
            }
        };

        match stream.next().await {
            Some(Ok(_)) => ProbeOutcome::Valid,
            Some(Err(err)) => {
                log::debug!("Cookie rate-limit probe observed error: {err}");
                ProbeOutcome::RateLimited { resets_at: None }
            }
            None => ProbeOutcome::Error,
        }
    }
}
