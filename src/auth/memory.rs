//! In-memory authentication provider.
//!
//! Backs development mode when no Firebase project is configured, and the
//! end-to-end tests. Error messages mirror the Firebase REST codes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use super::provider::{AuthProvider, IdpCredential, ProviderError, ProviderSession};
use crate::models::{Identity, ProviderTokens};

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password: Option<String>,
    display_name: Option<String>,
}

#[derive(Default)]
struct State {
    /// Accounts by lowercase email.
    accounts: HashMap<String, Account>,
    /// Refresh token -> uid.
    refresh_tokens: HashMap<String, String>,
}

/// Accounts kept in process memory.
pub struct InMemoryAuthProvider {
    state: Mutex<State>,
    token_ttl: Duration,
    calls: AtomicUsize,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::with_token_ttl(Duration::hours(1))
    }

    /// Issue tokens with a custom lifetime (a non-positive value yields already-expired tokens).
    pub fn with_token_ttl(token_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            token_ttl,
            calls: AtomicUsize::new(0),
        }
    }

    /// Seed an email/password account; returns its uid.
    pub fn add_account(&self, email: &str, password: &str, display_name: Option<&str>) -> String {
        let uid = Uuid::new_v4().simple().to_string();
        let mut state = self.lock();
        state.accounts.insert(
            email.to_lowercase(),
            Account {
                uid: uid.clone(),
                email: email.to_string(),
                password: Some(password.to_string()),
                display_name: display_name.map(str::to_string),
            },
        );
        uid
    }

    /// Invalidate every refresh token of an account.
    pub fn revoke_refresh_tokens(&self, uid: &str) {
        self.lock().refresh_tokens.retain(|_, owner| owner != uid);
    }

    /// Number of provider operations invoked so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn issue_tokens(&self, state: &mut State, uid: &str) -> ProviderTokens {
        let refresh = Uuid::new_v4().simple().to_string();
        state.refresh_tokens.insert(refresh.clone(), uid.to_string());
        ProviderTokens {
            id_token: SecretString::from(format!("mem-{}", Uuid::new_v4().simple())),
            refresh_token: SecretString::from(refresh),
            expires_at: Utc::now() + self.token_ttl,
        }
    }

    fn session_for(&self, state: &mut State, account: &Account) -> ProviderSession {
        let tokens = self.issue_tokens(state, &account.uid);
        ProviderSession {
            identity: identity_of(account),
            tokens,
        }
    }
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn identity_of(account: &Account) -> Identity {
    Identity {
        uid: account.uid.clone(),
        email: Some(account.email.clone()),
        display_name: account.display_name.clone(),
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        self.record_call();
        let mut state = self.lock();

        let account = state
            .accounts
            .get(&email.to_lowercase())
            .filter(|a| a.password.as_deref() == Some(password))
            .cloned()
            .ok_or_else(|| ProviderError::new("INVALID_LOGIN_CREDENTIALS"))?;

        Ok(self.session_for(&mut state, &account))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        self.record_call();
        if !email.contains('@') {
            return Err(ProviderError::new("INVALID_EMAIL"));
        }
        if password.chars().count() < 6 {
            return Err(ProviderError::new(
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        }

        let mut state = self.lock();
        let key = email.to_lowercase();
        if state.accounts.contains_key(&key) {
            return Err(ProviderError::new("EMAIL_EXISTS"));
        }

        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            password: Some(password.to_string()),
            display_name: None,
        };
        state.accounts.insert(key, account.clone());

        Ok(self.session_for(&mut state, &account))
    }

    async fn update_display_name(
        &self,
        session: &ProviderSession,
        display_name: &str,
    ) -> Result<Identity, ProviderError> {
        self.record_call();
        let mut state = self.lock();

        let account = state
            .accounts
            .values_mut()
            .find(|a| a.uid == session.identity.uid)
            .ok_or_else(|| ProviderError::new("USER_NOT_FOUND"))?;

        account.display_name = Some(display_name.to_string());
        Ok(identity_of(account))
    }

    async fn sign_in_with_idp(
        &self,
        credential: &IdpCredential,
    ) -> Result<ProviderSession, ProviderError> {
        self.record_call();
        // The ID token stands in for the federated email address.
        let email = credential.id_token.expose_secret().to_string();
        if !email.contains('@') {
            return Err(ProviderError::new("INVALID_IDP_RESPONSE"));
        }

        let mut state = self.lock();
        let key = email.to_lowercase();
        let account = match state.accounts.get(&key) {
            Some(existing) => existing.clone(),
            None => {
                let created = Account {
                    uid: Uuid::new_v4().simple().to_string(),
                    email,
                    password: None,
                    display_name: None,
                };
                state.accounts.insert(key, created.clone());
                created
            }
        };

        Ok(self.session_for(&mut state, &account))
    }

    async fn refresh(&self, tokens: &ProviderTokens) -> Result<ProviderTokens, ProviderError> {
        self.record_call();
        let mut state = self.lock();

        let uid = state
            .refresh_tokens
            .remove(tokens.refresh_token.expose_secret())
            .ok_or_else(|| ProviderError::new("TOKEN_EXPIRED"))?;

        Ok(self.issue_tokens(&mut state, &uid))
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}
