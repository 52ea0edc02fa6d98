//! The process-wide account pool (component C5, spec §4.5).

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use config::AccountsConfig;
use jiff::Timestamp;
use secrecy::SecretString;
use tokio::sync::Mutex;

use crate::{
    error::{CookieValidity, IdentityError, PoolError, ProbeOutcome},
    identity::{IdentityClient, RateLimitProber},
    model::{Account, AccountStatus, AuthType, OAuthToken},
    persistence,
};

/// Internal state guarded by [`AccountPool`]'s single mutex (spec §5:
/// "Account Pool internal state ... is guarded by one mutex").
struct PoolState {
    accounts: BTreeMap<String, Account>,
    cookie_to_uuid: HashMap<String, String>,
    session_accounts: HashMap<String, String>,
    account_sessions: HashMap<String, HashSet<String>>,
}

impl PoolState {
    fn index_cookie(&mut self, account: &Account) {
        if let Some(cookie) = &account.cookie_value {
            self.cookie_to_uuid
                .insert(expose(cookie), account.organization_uuid.clone());
        }
    }

    fn unindex_session(&mut self, session_id: &str) {
        if let Some(org_uuid) = self.session_accounts.remove(session_id)
            && let Some(sessions) = self.account_sessions.get_mut(&org_uuid)
        {
            sessions.remove(session_id);
        }
    }

    fn bind_session(&mut self, session_id: &str, org_uuid: &str) {
        self.session_accounts.insert(session_id.to_string(), org_uuid.to_string());
        self.account_sessions
            .entry(org_uuid.to_string())
            .or_default()
            .insert(session_id.to_string());
    }

    fn remove_account(&mut self, org_uuid: &str) {
        let Some(account) = self.accounts.remove(org_uuid) else {
            return;
        };

        if let Some(cookie) = &account.cookie_value {
            self.cookie_to_uuid.remove(&expose(cookie));
        }

        if let Some(sessions) = self.account_sessions.remove(org_uuid) {
            for session_id in sessions {
                self.session_accounts.remove(&session_id);
            }
        }
    }
}

fn expose(secret: &SecretString) -> String {
    use secrecy::ExposeSecret;
    secret.expose_secret().to_string()
}

/// Per-item outcome of a batch operation.
#[derive(Debug)]
pub struct BatchResult {
    /// How many items succeeded.
    pub success_count: usize,
    /// `(organization_uuid, error message)` for each failure.
    pub failures: Vec<(String, String)>,
}

/// Process-wide registry of authenticated Claude.ai accounts.
pub struct AccountPool {
    state: Mutex<PoolState>,
    config: AccountsConfig,
    identity: Arc<dyn IdentityClient>,
    prober: Arc<dyn RateLimitProber>,
}

impl AccountPool {
    /// Builds a pool, loading `accounts.json` from the configured data
    /// folder unless `no_filesystem_mode` is set.
    pub fn new(config: AccountsConfig, identity: Arc<dyn IdentityClient>, prober: Arc<dyn RateLimitProber>) -> Self {
        let accounts = if config.no_filesystem_mode {
            BTreeMap::new()
        } else {
            persistence::load(&config.accounts_file())
        };

        let mut cookie_to_uuid = HashMap::new();
        for account in accounts.values() {
            if let Some(cookie) = &account.cookie_value {
                cookie_to_uuid.insert(expose(cookie), account.organization_uuid.clone());
            }
        }

        log::info!("Account pool initialized with {} accounts", accounts.len());

        Self {
            state: Mutex::new(PoolState {
                accounts,
                cookie_to_uuid,
                session_accounts: HashMap::new(),
                account_sessions: HashMap::new(),
            }),
            config,
            identity,
            prober,
        }
    }

    fn save_accounts(&self, state: &PoolState) {
        if self.config.no_filesystem_mode {
            return;
        }

        if let Err(err) = persistence::save(&self.config.accounts_file(), &state.accounts) {
            log::error!("Failed to persist accounts: {err}");
        }
    }

    /// Adds (or returns the existing) account for a cookie and/or OAuth
    /// token, using double-checked locking so the identity-endpoint
    /// network call does not serialize unrelated inserts (spec §4.5.2).
    pub async fn add_account(
        &self,
        cookie_value: Option<SecretString>,
        oauth_token: Option<OAuthToken>,
        organization_uuid: Option<String>,
        capabilities: Option<Vec<String>>,
    ) -> Result<Account, PoolError> {
        if cookie_value.is_none() && oauth_token.is_none() {
            return Err(PoolError::MissingCredentials);
        }

        // Phase 1 (locked, fast): cookie already known?
        if let Some(cookie) = &cookie_value {
            let state = self.state.lock().await;
            if let Some(org_uuid) = state.cookie_to_uuid.get(&expose(cookie)) {
                return Ok(state.accounts[org_uuid].clone());
            }
        }

        // Phase 2 (unlocked, slow): resolve org UUID + capabilities.
        let mut organization_uuid = organization_uuid;
        let mut capabilities = capabilities.unwrap_or_default();

        if let Some(cookie) = &cookie_value
            && (organization_uuid.is_none() || capabilities.is_empty())
        {
            match self.identity.get_organization_info(cookie).await {
                Ok((fetched_uuid, fetched_caps)) => {
                    if let Some(uuid) = fetched_uuid {
                        organization_uuid = Some(uuid);
                    }
                    if !fetched_caps.is_empty() {
                        capabilities = fetched_caps;
                    }
                }
                Err(err) => log::warn!("Failed to fetch organization info: {err}"),
            }
        }

        // Phase 3 (locked, fast): re-check, then create/update + persist.
        let mut state = self.state.lock().await;

        if let Some(cookie) = &cookie_value
            && let Some(org_uuid) = state.cookie_to_uuid.get(&expose(cookie)).cloned()
        {
            return Ok(state.accounts[&org_uuid].clone());
        }

        if let Some(org_uuid) = &organization_uuid
            && state.accounts.contains_key(org_uuid)
        {
            let mut old_cookie_to_remove = None;
            let mut new_cookie_to_insert = None;
            {
                let existing = state.accounts.get_mut(org_uuid).expect("checked above");
                if let Some(new_cookie) = &cookie_value
                    && existing.cookie_value.as_ref().map(expose) != Some(expose(new_cookie))
                {
                    old_cookie_to_remove = existing.cookie_value.clone();
                    existing.cookie_value = Some(new_cookie.clone());
                    new_cookie_to_insert = Some((expose(new_cookie), org_uuid.clone()));
                }
            }
            if let Some(old_cookie) = &old_cookie_to_remove {
                state.cookie_to_uuid.remove(&expose(old_cookie));
            }
            if let Some((new_key, org)) = new_cookie_to_insert {
                state.cookie_to_uuid.insert(new_key, org);
            }
            let account = state.accounts[org_uuid].clone();
            self.save_accounts(&state);
            return Ok(account);
        }

        let organization_uuid = organization_uuid.unwrap_or_else(Account::generate_uuid);
        let account = Account::new(organization_uuid, cookie_value, oauth_token, capabilities);

        state.accounts.insert(account.organization_uuid.clone(), account.clone());
        state.index_cookie(&account);
        self.save_accounts(&state);

        drop(state);

        log::info!(
            "Added account {} (auth_type: {:?})",
            &account.organization_uuid[..8.min(account.organization_uuid.len())],
            account.auth_type
        );

        if account.auth_type == AuthType::CookieOnly {
            let identity = self.identity.clone();
            let org_uuid = account.organization_uuid.clone();
            let cookie = account.cookie_value.clone();
            tokio::spawn(async move {
                if let Some(cookie) = cookie {
                    match identity.enroll_oauth(&cookie).await {
                        Ok(_) => log::info!("Best-effort OAuth enrollment succeeded for {org_uuid}"),
                        Err(err) => log::debug!("Best-effort OAuth enrollment failed for {org_uuid}: {err}"),
                    }
                }
            });
        }

        Ok(account)
    }

    /// Removes a single account and persists the change.
    pub async fn remove_account(&self, organization_uuid: &str) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;

        if !state.accounts.contains_key(organization_uuid) {
            return Err(PoolError::AccountNotFound(organization_uuid.to_string()));
        }

        state.remove_account(organization_uuid);
        self.save_accounts(&state);

        Ok(())
    }

    /// Removes a batch of accounts with a single persist at the end.
    pub async fn batch_remove_accounts(&self, organization_uuids: &[String]) -> BatchResult {
        let mut state = self.state.lock().await;

        let mut success_count = 0;
        let mut failures = Vec::new();

        for org_uuid in organization_uuids {
            if !state.accounts.contains_key(org_uuid) {
                failures.push((org_uuid.clone(), "account not found".to_string()));
                continue;
            }
            state.remove_account(org_uuid);
            success_count += 1;
        }

        if success_count > 0 {
            self.save_accounts(&state);
        }

        BatchResult { success_count, failures }
    }

    /// Assigns (or reuses) an account for a logical session, preferring the
    /// least-loaded eligible account (spec §4.5.1).
    pub async fn get_account_for_session(
        &self,
        session_id: &str,
        is_pro: Option<bool>,
        is_max: Option<bool>,
    ) -> Result<Account, PoolError> {
        let mut state = self.state.lock().await;

        if let Some(org_uuid) = state.session_accounts.get(session_id).cloned() {
            if let Some(account) = state.accounts.get(&org_uuid)
                && account.status == AccountStatus::Valid
            {
                return Ok(account.clone());
            }
            state.unindex_session(session_id);
        }

        let mut best: Option<(String, usize)> = None;
        let mut best_last_used: Option<Timestamp> = None;

        for account in state.accounts.values() {
            if account.status != AccountStatus::Valid {
                continue;
            }
            if !matches!(account.auth_type, AuthType::Both | AuthType::CookieOnly) {
                continue;
            }
            if let Some(is_pro) = is_pro
                && account.is_pro() != is_pro
            {
                continue;
            }
            if let Some(is_max) = is_max
                && account.is_max() != is_max
            {
                continue;
            }

            let session_count = state
                .account_sessions
                .get(&account.organization_uuid)
                .map(HashSet::len)
                .unwrap_or(0);

            if session_count >= self.config.max_sessions_per_cookie {
                continue;
            }

            let is_better = match &best {
                None => true,
                Some((_, best_count)) => {
                    session_count < *best_count
                        || (session_count == *best_count
                            && best_last_used.is_some_and(|t| account.last_used < t))
                }
            };

            if is_better {
                best = Some((account.organization_uuid.clone(), session_count));
                best_last_used = Some(account.last_used);
            }
        }

        let Some((org_uuid, _)) = best else {
            return Err(PoolError::NoAccountsAvailable);
        };

        state.bind_session(session_id, &org_uuid);
        let account = state.accounts[&org_uuid].clone();

        log::debug!(
            "Assigned account to session {session_id}, account now has {} sessions",
            state.account_sessions[&org_uuid].len()
        );

        Ok(account)
    }

    /// Picks the OAuth-capable, valid account with the oldest `last_used`.
    pub async fn get_account_for_oauth(
        &self,
        is_pro: Option<bool>,
        is_max: Option<bool>,
    ) -> Result<Account, PoolError> {
        let state = self.state.lock().await;

        state
            .accounts
            .values()
            .filter(|a| a.status == AccountStatus::Valid)
            .filter(|a| matches!(a.auth_type, AuthType::Both | AuthType::OauthOnly))
            .filter(|a| is_pro.is_none_or(|want| a.is_pro() == want))
            .filter(|a| is_max.is_none_or(|want| a.is_max() == want))
            .min_by_key(|a| a.last_used)
            .cloned()
            .ok_or(PoolError::NoAccountsAvailable)
    }

    /// Runs one tick of the background maintenance loop: recovers
    /// rate-limited accounts whose timer has expired and kicks off
    /// detached OAuth refreshes for tokens about to expire (spec §4.5.4).
    pub async fn run_maintenance_tick(self: &Arc<Self>) {
        let now = Timestamp::now();
        let mut to_refresh = Vec::new();

        {
            let mut state = self.state.lock().await;
            let mut recovered = false;

            for account in state.accounts.values_mut() {
                if account.status == AccountStatus::RateLimited
                    && account.resets_at.is_some_and(|resets_at| resets_at <= now)
                {
                    account.status = AccountStatus::Valid;
                    account.resets_at = None;
                    recovered = true;
                    log::info!("Account {} recovered from rate limit", account.organization_uuid);
                }

                if let Some(token) = &account.oauth_token
                    && token.expires_within(now, 300)
                {
                    to_refresh.push((account.organization_uuid.clone(), token.clone()));
                }
            }

            if recovered {
                self.save_accounts(&state);
            }
        }

        for (org_uuid, token) in to_refresh {
            let pool = self.clone();
            tokio::spawn(async move { pool.refresh_oauth_token(&org_uuid, &token).await });
        }
    }

    async fn refresh_oauth_token(&self, org_uuid: &str, token: &OAuthToken) {
        match self.identity.refresh_oauth(token).await {
            Ok(new_token) => {
                let mut state = self.state.lock().await;
                if let Some(account) = state.accounts.get_mut(org_uuid) {
                    account.oauth_token = Some(new_token);
                }
                self.save_accounts(&state);
            }
            Err(err) => {
                log::warn!("OAuth refresh failed for {org_uuid}: {err}");
                let mut state = self.state.lock().await;
                if let Some(account) = state.accounts.get_mut(org_uuid) {
                    match account.auth_type {
                        AuthType::Both => {
                            account.auth_type = AuthType::CookieOnly;
                            account.oauth_token = None;
                        }
                        _ => account.status = AccountStatus::Invalid,
                    }
                }
                self.save_accounts(&state);
            }
        }
    }

    /// Performs the deep re-validation described in spec §4.5.5: cookie
    /// validation, best-effort OAuth refresh, and (when currently
    /// rate-limited) a recovery probe, all outside the pool lock, followed
    /// by a single locked status transition.
    pub async fn refresh_account_status(&self, organization_uuid: &str) -> Result<Account, PoolError> {
        let (cookie, oauth_token, current_status) = {
            let state = self.state.lock().await;
            let account = state
                .accounts
                .get(organization_uuid)
                .ok_or_else(|| PoolError::AccountNotFound(organization_uuid.to_string()))?;
            (account.cookie_value.clone(), account.oauth_token.clone(), account.status)
        };

        let cookie_valid = match &cookie {
            Some(cookie) => match self.identity.validate_cookie(cookie).await {
                CookieValidity::Valid => Some(true),
                CookieValidity::Invalid => Some(false),
                CookieValidity::Unknown => None,
            },
            None => None,
        };

        let refreshed_capabilities = if cookie_valid == Some(true)
            && let Some(cookie) = &cookie
        {
            self.identity.get_organization_info(cookie).await.ok()
        } else {
            None
        };

        if let Some(token) = &oauth_token {
            match self.identity.refresh_oauth(token).await {
                Ok(new_token) => {
                    let mut state = self.state.lock().await;
                    if let Some(account) = state.accounts.get_mut(organization_uuid) {
                        account.oauth_token = Some(new_token);
                    }
                }
                Err(err) => log::debug!("Best-effort OAuth refresh failed for {organization_uuid}: {err}"),
            }
        }

        let probe_outcome = if current_status == AccountStatus::RateLimited && cookie_valid == Some(true) {
            let state = self.state.lock().await;
            let account = state
                .accounts
                .get(organization_uuid)
                .ok_or_else(|| PoolError::AccountNotFound(organization_uuid.to_string()))?;
            let oauth_token = account.oauth_token.clone();
            let cookie = account.cookie_value.clone();
            drop(state);

            Some(match oauth_token {
                Some(token) => self.prober.probe_oauth(&token).await,
                None => match cookie {
                    Some(cookie) => self.prober.probe_cookie(&cookie).await,
                    None => ProbeOutcome::Error,
                },
            })
        } else {
            None
        };

        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(organization_uuid)
            .ok_or_else(|| PoolError::AccountNotFound(organization_uuid.to_string()))?;

        apply_status_transition(account, cookie_valid, probe_outcome);

        if let Some((_, caps)) = refreshed_capabilities
            && !caps.is_empty()
        {
            account.capabilities = caps;
        }

        let result = account.clone();
        self.save_accounts(&state);

        Ok(result)
    }

    /// Fans out [`Self::refresh_account_status`] over `organization_uuids`
    /// bounded by `min(concurrency, 20)` in-flight refreshes.
    pub async fn batch_refresh_accounts(
        self: &Arc<Self>,
        organization_uuids: Vec<String>,
        concurrency: usize,
    ) -> Vec<(String, Result<Account, PoolError>)> {
        let permits = Arc::new(tokio::sync::Semaphore::new(concurrency.min(20).max(1)));
        let mut handles = Vec::with_capacity(organization_uuids.len());

        for org_uuid in organization_uuids {
            let pool = self.clone();
            let permits = permits.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.expect("semaphore not closed");
                let result = pool.refresh_account_status(&org_uuid).await;
                (org_uuid, result)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(pair) => results.push(pair),
                Err(err) => log::error!("Refresh task panicked: {err}"),
            }
        }

        results
    }
}

fn apply_status_transition(account: &mut Account, cookie_valid: Option<bool>, probe: Option<ProbeOutcome>) {
    match (account.status, cookie_valid) {
        (AccountStatus::RateLimited, Some(false)) => {
            account.status = AccountStatus::Invalid;
            account.resets_at = None;
        }
        (AccountStatus::RateLimited, Some(true)) => match probe {
            Some(ProbeOutcome::Valid) => {
                account.status = AccountStatus::Valid;
                account.resets_at = None;
            }
            Some(ProbeOutcome::RateLimited { resets_at }) => {
                account.status = AccountStatus::RateLimited;
                if resets_at.is_some() {
                    account.resets_at = resets_at;
                }
            }
            Some(ProbeOutcome::Error) | None => {
                // Unchanged.
            }
        },
        (AccountStatus::RateLimited, None) => {}
        (AccountStatus::Invalid, Some(true)) => {
            account.status = AccountStatus::Valid;
            account.resets_at = None;
        }
        (AccountStatus::Invalid, Some(false) | None) => {}
        (AccountStatus::Valid, Some(false)) => {
            account.status = AccountStatus::Invalid;
        }
        (AccountStatus::Valid, Some(true) | None) => {}
    }
}

impl From<IdentityError> for PoolError {
    fn from(err: IdentityError) -> Self {
        PoolError::Persist(std::io::Error::other(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jiff::Timestamp;
    use secrecy::SecretString;

    use super::*;
    use crate::test_support::{FakeIdentity, FakeProber};

    fn account_with_status(status: AccountStatus) -> Account {
        let mut account = Account::new(
            "org-1".to_string(),
            Some(SecretString::from("cookie")),
            None,
            vec!["pro".to_string()],
        );
        account.status = status;
        if status == AccountStatus::RateLimited {
            account.resets_at = Some(Timestamp::now());
        }
        account
    }

    #[test]
    fn rate_limited_invalid_cookie_becomes_invalid() {
        let mut account = account_with_status(AccountStatus::RateLimited);
        apply_status_transition(&mut account, Some(false), None);
        assert_eq!(account.status, AccountStatus::Invalid);
        assert!(account.resets_at.is_none());
    }

    #[test]
    fn rate_limited_valid_cookie_valid_probe_recovers() {
        let mut account = account_with_status(AccountStatus::RateLimited);
        apply_status_transition(&mut account, Some(true), Some(ProbeOutcome::Valid));
        assert_eq!(account.status, AccountStatus::Valid);
        assert!(account.resets_at.is_none());
    }

    #[test]
    fn rate_limited_valid_cookie_still_rate_limited_probe_prefers_new_resets_at() {
        let mut account = account_with_status(AccountStatus::RateLimited);
        let original_resets_at = account.resets_at;
        let new_resets_at = Timestamp::from_second(Timestamp::now().as_second() + 3600).ok();

        apply_status_transition(
            &mut account,
            Some(true),
            Some(ProbeOutcome::RateLimited { resets_at: new_resets_at }),
        );

        assert_eq!(account.status, AccountStatus::RateLimited);
        assert_eq!(account.resets_at, new_resets_at);
        assert_ne!(account.resets_at, original_resets_at);
    }

    #[test]
    fn rate_limited_valid_cookie_still_rate_limited_probe_keeps_existing_resets_at_when_header_absent() {
        let mut account = account_with_status(AccountStatus::RateLimited);
        let original_resets_at = account.resets_at;

        apply_status_transition(&mut account, Some(true), Some(ProbeOutcome::RateLimited { resets_at: None }));

        assert_eq!(account.status, AccountStatus::RateLimited);
        assert_eq!(account.resets_at, original_resets_at);
    }

    #[test]
    fn rate_limited_valid_cookie_probe_error_is_unchanged() {
        let mut account = account_with_status(AccountStatus::RateLimited);
        let original_resets_at = account.resets_at;

        apply_status_transition(&mut account, Some(true), Some(ProbeOutcome::Error));

        assert_eq!(account.status, AccountStatus::RateLimited);
        assert_eq!(account.resets_at, original_resets_at);
    }

    #[test]
    fn rate_limited_cookie_less_account_is_unchanged() {
        let mut account = account_with_status(AccountStatus::RateLimited);
        let original_resets_at = account.resets_at;

        apply_status_transition(&mut account, None, None);

        assert_eq!(account.status, AccountStatus::RateLimited);
        assert_eq!(account.resets_at, original_resets_at);
    }

    #[test]
    fn invalid_with_valid_cookie_recovers() {
        let mut account = account_with_status(AccountStatus::Invalid);
        apply_status_transition(&mut account, Some(true), None);
        assert_eq!(account.status, AccountStatus::Valid);
    }

    #[test]
    fn invalid_with_invalid_or_unknown_cookie_is_unchanged() {
        let mut account = account_with_status(AccountStatus::Invalid);
        apply_status_transition(&mut account, Some(false), None);
        assert_eq!(account.status, AccountStatus::Invalid);

        let mut account = account_with_status(AccountStatus::Invalid);
        apply_status_transition(&mut account, None, None);
        assert_eq!(account.status, AccountStatus::Invalid);
    }

    #[test]
    fn valid_with_invalid_cookie_becomes_invalid() {
        let mut account = account_with_status(AccountStatus::Valid);
        apply_status_transition(&mut account, Some(false), None);
        assert_eq!(account.status, AccountStatus::Invalid);
    }

    #[test]
    fn valid_with_valid_or_unknown_cookie_is_unchanged() {
        let mut account = account_with_status(AccountStatus::Valid);
        apply_status_transition(&mut account, Some(true), None);
        assert_eq!(account.status, AccountStatus::Valid);

        let mut account = account_with_status(AccountStatus::Valid);
        apply_status_transition(&mut account, None, None);
        assert_eq!(account.status, AccountStatus::Valid);
    }

    fn test_pool_with(identity: Arc<FakeIdentity>, prober: Arc<FakeProber>) -> AccountPool {
        let config = AccountsConfig {
            no_filesystem_mode: true,
            ..Default::default()
        };
        AccountPool::new(config, identity, prober)
    }

    #[tokio::test]
    async fn refresh_account_status_recovers_rate_limited_account_on_valid_probe() {
        let pool = test_pool_with(
            Arc::new(FakeIdentity::with_cookie_validity(CookieValidity::Valid)),
            Arc::new(FakeProber::new(ProbeOutcome::Valid)),
        );

        let account = pool
            .add_account(Some(SecretString::from("cookie-a")), None, Some("org-a".to_string()), None)
            .await
            .unwrap();
        {
            let mut state = pool.state.lock().await;
            let account = state.accounts.get_mut(&account.organization_uuid).unwrap();
            account.status = AccountStatus::RateLimited;
            account.resets_at = Some(Timestamp::now());
        }

        let refreshed = pool.refresh_account_status(&account.organization_uuid).await.unwrap();

        assert_eq!(refreshed.status, AccountStatus::Valid);
        assert!(refreshed.resets_at.is_none());
    }

    #[tokio::test]
    async fn refresh_account_status_does_not_probe_cookie_less_rate_limited_account() {
        let identity = Arc::new(FakeIdentity::with_cookie_validity(CookieValidity::Valid));
        let pool = test_pool_with(identity, Arc::new(FakeProber::new(ProbeOutcome::Valid)));

        let account = pool
            .add_account(None, Some(OAuthToken {
                access_token: SecretString::from("access"),
                refresh_token: SecretString::from("refresh"),
                expires_at: Timestamp::now().as_second() + 3600,
            }), Some("org-a".to_string()), None)
            .await
            .unwrap();
        {
            let mut state = pool.state.lock().await;
            let account = state.accounts.get_mut(&account.organization_uuid).unwrap();
            account.status = AccountStatus::RateLimited;
            account.resets_at = Some(Timestamp::now());
        }

        let refreshed = pool.refresh_account_status(&account.organization_uuid).await.unwrap();

        // No cookie to validate or probe through: status must be left alone.
        assert_eq!(refreshed.status, AccountStatus::RateLimited);
        assert!(refreshed.resets_at.is_some());
    }
}
