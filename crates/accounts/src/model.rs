//! The account data model (see spec §3).

use jiff::Timestamp;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which credentials an account carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Only a Claude.ai session cookie is available.
    CookieOnly,
    /// Only an OAuth token pair is available.
    OauthOnly,
    /// Both a cookie and an OAuth token are available.
    Both,
}

/// Lifecycle status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Usable for new session assignment.
    Valid,
    /// Suspended until `resets_at`.
    RateLimited,
    /// Credentials are known to be bad; requires manual intervention.
    Invalid,
}

/// An OAuth access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Bearer token used on the Anthropic API.
    #[serde(with = "secret_string")]
    pub access_token: SecretString,
    /// Token used to mint a new access token once it expires.
    #[serde(with = "secret_string")]
    pub refresh_token: SecretString,
    /// Seconds since the Unix epoch at which `access_token` expires.
    pub expires_at: i64,
}

impl OAuthToken {
    /// Whether the access token expires within `horizon` seconds from now.
    pub fn expires_within(&self, now: Timestamp, horizon_secs: i64) -> bool {
        let expires_at = Timestamp::from_second(self.expires_at).unwrap_or(now);
        (expires_at.as_second() - now.as_second()) < horizon_secs
    }
}

mod secret_string {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.expose_secret())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SecretString::from(raw))
    }
}

/// An authenticated Claude.ai identity known to the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Stable key identifying the account.
    pub organization_uuid: String,
    /// Which credentials this account carries.
    pub auth_type: AuthType,
    /// The Claude.ai session cookie, if any.
    #[serde(default, with = "opt_secret_string")]
    pub cookie_value: Option<SecretString>,
    /// OAuth access/refresh token pair, if any.
    #[serde(default)]
    pub oauth_token: Option<OAuthToken>,
    /// Plan capabilities reported by Claude.ai (e.g. `"pro"`, `"max"`).
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Current lifecycle status.
    pub status: AccountStatus,
    /// When a `rate_limited` account is expected to recover. Always `None`
    /// unless `status == RateLimited`.
    #[serde(default)]
    pub resets_at: Option<Timestamp>,
    /// Last time this account was handed out to a session.
    pub last_used: Timestamp,
}

mod opt_secret_string {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(v.expose_secret()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SecretString>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.map(SecretString::from))
    }
}

impl Account {
    /// Build a freshly-minted account, choosing `auth_type` from the
    /// credentials supplied.
    pub fn new(
        organization_uuid: String,
        cookie_value: Option<SecretString>,
        oauth_token: Option<OAuthToken>,
        capabilities: Vec<String>,
    ) -> Self {
        let auth_type = match (&cookie_value, &oauth_token) {
            (Some(_), Some(_)) => AuthType::Both,
            (Some(_), None) => AuthType::CookieOnly,
            (None, Some(_)) => AuthType::OauthOnly,
            (None, None) => unreachable!("caller must supply at least one credential"),
        };

        Self {
            organization_uuid,
            auth_type,
            cookie_value,
            oauth_token,
            capabilities,
            status: AccountStatus::Valid,
            resets_at: None,
            last_used: Timestamp::now(),
        }
    }

    /// Whether the account reports the `pro` plan capability.
    pub fn is_pro(&self) -> bool {
        self.capabilities.iter().any(|c| c == "pro")
    }

    /// Whether the account reports the `max` plan capability.
    pub fn is_max(&self) -> bool {
        self.capabilities.iter().any(|c| c == "max")
    }

    /// Whether this account can authenticate cookie-based (web) sessions.
    pub fn is_cookie_capable(&self) -> bool {
        matches!(self.auth_type, AuthType::Both | AuthType::CookieOnly) && self.cookie_value.is_some()
    }

    /// Whether this account can authenticate OAuth (API) sessions.
    pub fn is_oauth_capable(&self) -> bool {
        matches!(self.auth_type, AuthType::Both | AuthType::OauthOnly) && self.oauth_token.is_some()
    }

    pub(crate) fn generate_uuid() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_type_inferred_from_credentials() {
        let account = Account::new(
            "org-1".to_string(),
            Some(SecretString::from("cookie")),
            None,
            vec!["pro".to_string()],
        );

        assert_eq!(account.auth_type, AuthType::CookieOnly);
        assert!(account.is_pro());
        assert!(!account.is_max());
    }

    #[test]
    fn resets_at_invariant_roundtrip() {
        let mut account = Account::new("org-2".to_string(), Some(SecretString::from("c")), None, vec![]);

        account.status = AccountStatus::RateLimited;
        account.resets_at = Some(Timestamp::now());

        let json = serde_json::to_string(&account).unwrap();
        let restored: Account = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.status, AccountStatus::RateLimited);
        assert!(restored.resets_at.is_some());
    }
}
