//! Error taxonomy for the account pool (see spec §7).

use jiff::Timestamp;
use thiserror::Error;

/// Errors surfaced by [`crate::AccountPool`] operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No account satisfied the selection filters.
    #[error("no accounts available")]
    NoAccountsAvailable,
    /// The requested account does not exist in the pool.
    #[error("account {0} not found")]
    AccountNotFound(String),
    /// Neither a cookie nor an OAuth token was supplied to `add_account`.
    #[error("either a cookie or an OAuth token must be provided")]
    MissingCredentials,
    /// Persisting `accounts.json` failed.
    #[error("failed to persist accounts: {0}")]
    Persist(#[source] std::io::Error),
}

/// Outcome of validating a cookie against the identity endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieValidity {
    /// The cookie authenticates successfully.
    Valid,
    /// The identity endpoint rejected the cookie outright.
    Invalid,
    /// A transient/network error occurred; status should not change.
    Unknown,
}

/// Outcome of a rate-limit probe (see spec §4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The account can serve requests again.
    Valid,
    /// The account is still rate limited.
    RateLimited {
        /// When the rate limit is expected to clear, if known.
        resets_at: Option<Timestamp>,
    },
    /// The probe itself failed; status should not change.
    Error,
}

/// Errors from the identity/OAuth network collaborator.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The upstream rejected the credential outright.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Any other network or protocol failure.
    #[error("identity request failed: {0}")]
    Transport(String),
}
