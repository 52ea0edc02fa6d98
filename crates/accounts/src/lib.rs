#![deny(missing_docs)]
//! Process-wide pool of authenticated Claude.ai accounts (component C5)
//! and the rate-limit probing contract it depends on (component C7).

mod error;
mod identity;
mod model;
mod persistence;
mod pool;
#[cfg(test)]
mod test_support;

pub use error::{CookieValidity, IdentityError, PoolError, ProbeOutcome};
pub use identity::{IdentityClient, RateLimitProber};
pub use model::{Account, AccountStatus, AuthType, OAuthToken};
pub use pool::{AccountPool, BatchResult};
