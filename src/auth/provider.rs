//! Authentication provider abstraction.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::models::{Identity, ProviderTokens};

/// Error reported by the authentication provider.
///
/// The message is opaque and shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A successful sign-in: who signed in and the tokens proving it.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub identity: Identity,
    pub tokens: ProviderTokens,
}

/// Credential obtained from an external identity provider (federated sign-in).
#[derive(Debug, Clone)]
pub struct IdpCredential {
    /// Provider id understood by the authentication provider, e.g. `google.com`.
    pub provider_id: String,
    pub id_token: SecretString,
    /// Callback URL the credential was issued for.
    pub request_uri: String,
}

/// Operations consumed from the authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify an email/password pair.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError>;

    /// Create an email/password account and sign it in.
    async fn sign_up(&self, email: &str, password: &str)
    -> Result<ProviderSession, ProviderError>;

    /// Attach a display name to a freshly created account.
    async fn update_display_name(
        &self,
        session: &ProviderSession,
        display_name: &str,
    ) -> Result<Identity, ProviderError>;

    /// Sign in with a credential issued by a federated identity provider.
    async fn sign_in_with_idp(
        &self,
        credential: &IdpCredential,
    ) -> Result<ProviderSession, ProviderError>;

    /// Exchange a refresh token for fresh tokens.
    async fn refresh(&self, tokens: &ProviderTokens) -> Result<ProviderTokens, ProviderError>;

    /// End the provider session. Token-based providers have nothing to revoke.
    async fn sign_out(&self, _tokens: &ProviderTokens) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Short backend name for readiness reporting.
    fn backend(&self) -> &'static str;
}
