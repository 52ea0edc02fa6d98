//! Placeholder [`IdentityClient`] and [`Session`] implementations for
//! deployments that have not wired in a real Claude.ai integration (spec
//! §1: the impersonating HTTP client and Claude-web wire details are
//! external collaborators this workspace does not own).

use std::pin::Pin;

use accounts::{CookieValidity, IdentityClient, IdentityError, OAuthToken};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use secrecy::SecretString;

use crate::{error::SessionError, model::ClaudeWebRequest, session::Session};

/// An [`IdentityClient`] that reports every operation as unavailable.
/// Useful for running the proxy against OAuth-only accounts, or as the
/// default until a real identity integration is wired in.
pub struct NotConfiguredIdentityClient;

#[async_trait]
impl IdentityClient for NotConfiguredIdentityClient {
    async fn get_organization_info(
        &self,
        _cookie: &SecretString,
    ) -> Result<(Option<String>, Vec<String>), IdentityError> {
        Err(IdentityError::Transport("no identity client configured".to_string()))
    }

    async fn validate_cookie(&self, _cookie: &SecretString) -> CookieValidity {
        CookieValidity::Unknown
    }

    async fn enroll_oauth(&self, _cookie: &SecretString) -> Result<OAuthToken, IdentityError> {
        Err(IdentityError::Transport("no identity client configured".to_string()))
    }

    async fn refresh_oauth(&self, token: &OAuthToken) -> Result<OAuthToken, IdentityError> {
        Err(IdentityError::Authentication(format!(
            "no identity client configured to refresh token expiring at {}",
            token.expires_at
        )))
    }
}

/// A [`Session`] that reports every operation as unavailable. The real
/// Claude-web transport (endpoints, cookie handling, response envelopes)
/// is an external collaborator; deployments wire their own implementation
/// in before traffic can flow.
pub struct NotConfiguredSession;

#[async_trait]
impl Session for NotConfiguredSession {
    async fn upload_file(&self, _data: Vec<u8>, filename: &str, _content_type: &str) -> Result<String, SessionError> {
        Err(SessionError::AttachmentUpload {
            filename: filename.to_string(),
            reason: "no session transport configured".to_string(),
        })
    }

    async fn ensure_conversation_initialized(&self) -> Result<(), SessionError> {
        Err(SessionError::ConversationInit("no session transport configured".to_string()))
    }

    async fn set_paprika_mode(&self, _mode: Option<&str>) -> Result<(), SessionError> {
        Err(SessionError::ConversationInit("no session transport configured".to_string()))
    }

    async fn set_web_search(&self, _enabled: bool) -> Result<(), SessionError> {
        Err(SessionError::ConversationInit("no session transport configured".to_string()))
    }

    async fn send_message(
        &self,
        _request: ClaudeWebRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Bytes, SessionError>> + Send>>, SessionError> {
        Err(SessionError::SendFailed("no session transport configured".to_string()))
    }
}
