//! Identity and browser-session models.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Opaque id of one browser session, carried inside the signed session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn generate() -> Self {
        let random_bytes: [u8; 32] = rand::random();
        Self(hex::encode(random_bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only a prefix ever reaches the logs.
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "{}…", prefix)
    }
}

/// The signed-in user as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned unique id; owns the user's upload collection.
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    /// Name shown in the header: display name, falling back to the email.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Provider credentials backing a signed-in session.
#[derive(Debug, Clone)]
pub struct ProviderTokens {
    /// Short-lived token presented to the realtime database.
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl ProviderTokens {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Session cookie JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Browser session id
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
}
