//! Test doubles for [`IdentityClient`] and [`RateLimitProber`], shared by
//! this crate's unit tests so [`crate::pool`] and the top-level tests don't
//! duplicate fakes that hit no real network.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{
    error::{CookieValidity, IdentityError, ProbeOutcome},
    identity::{IdentityClient, RateLimitProber},
    model::OAuthToken,
};

/// A stub identity client whose organization lookup always succeeds and
/// counts how many times it was actually called, so callers can assert on
/// de-duplicated network access (e.g. concurrent `add_account`s for the
/// same cookie).
pub struct FakeIdentity {
    pub organization_info_calls: AtomicUsize,
    pub cookie_validity: CookieValidity,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        Self {
            organization_info_calls: AtomicUsize::new(0),
            cookie_validity: CookieValidity::Valid,
        }
    }
}

impl FakeIdentity {
    pub fn with_cookie_validity(validity: CookieValidity) -> Self {
        Self {
            cookie_validity: validity,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.organization_info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityClient for FakeIdentity {
    async fn get_organization_info(&self, _cookie: &SecretString) -> Result<(Option<String>, Vec<String>), IdentityError> {
        self.organization_info_calls.fetch_add(1, Ordering::SeqCst);
        // Yields so two concurrent `add_account` calls against the same
        // cookie actually interleave (both reach phase 2 before either
        // commits), exercising the double-checked-locking re-check rather
        // than two callers that happen to run strictly sequentially.
        tokio::task::yield_now().await;
        Ok((None, vec!["pro".to_string()]))
    }

    async fn validate_cookie(&self, _cookie: &SecretString) -> CookieValidity {
        self.cookie_validity
    }

    async fn enroll_oauth(&self, _cookie: &SecretString) -> Result<OAuthToken, IdentityError> {
        Err(IdentityError::Transport("not implemented in fake".to_string()))
    }

    async fn refresh_oauth(&self, token: &OAuthToken) -> Result<OAuthToken, IdentityError> {
        Ok(token.clone())
    }
}

/// A stub prober whose outcome is fixed at construction.
pub struct FakeProber {
    pub outcome: ProbeOutcome,
}

impl FakeProber {
    pub fn new(outcome: ProbeOutcome) -> Self {
        Self { outcome }
    }
}

#[async_trait]
impl RateLimitProber for FakeProber {
    async fn probe_oauth(&self, _token: &OAuthToken) -> ProbeOutcome {
        self.outcome.clone()
    }

    async fn probe_cookie(&self, _cookie: &SecretString) -> ProbeOutcome {
        self.outcome.clone()
    }
}
