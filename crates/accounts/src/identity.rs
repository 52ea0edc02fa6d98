//! Network collaborators the pool depends on but does not own the wire
//! details of (see spec §1, "out of scope").
//!
//! Concrete implementations live outside this crate (the impersonating
//! HTTP client and the Claude-web session machinery are external
//! collaborators); the pool is written against these traits so it can be
//! exercised with fakes in tests.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{
    error::{CookieValidity, IdentityError, ProbeOutcome},
    model::OAuthToken,
};

/// Resolves identity and OAuth details for a cookie-authenticated account.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Fetches the organization UUID and plan capabilities for a cookie.
    async fn get_organization_info(&self, cookie: &SecretString) -> Result<(Option<String>, Vec<String>), IdentityError>;

    /// Validates a cookie against the identity endpoint without mutating
    /// any state.
    async fn validate_cookie(&self, cookie: &SecretString) -> CookieValidity;

    /// Attempts to mint OAuth credentials for an account that currently
    /// only has a cookie. Used for best-effort OAuth enrollment.
    async fn enroll_oauth(&self, cookie: &SecretString) -> Result<OAuthToken, IdentityError>;

    /// Refreshes an OAuth token pair.
    async fn refresh_oauth(&self, token: &OAuthToken) -> Result<OAuthToken, IdentityError>;
}

/// Performs the minimal-chat rate-limit probe described in spec §4.7.
#[async_trait]
pub trait RateLimitProber: Send + Sync {
    /// OAuth path: a single-token completion against the Anthropic API.
    async fn probe_oauth(&self, token: &OAuthToken) -> ProbeOutcome;

    /// Cookie path: a throwaway Claude-web conversation.
    async fn probe_cookie(&self, cookie: &SecretString) -> ProbeOutcome;
}
