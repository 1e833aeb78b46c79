//! Firebase Authentication over its REST API.
//!
//! Endpoints used:
//! - `accounts:signInWithPassword` — email/password sign-in
//! - `accounts:signUp` — account creation
//! - `accounts:update` — display name
//! - `accounts:signInWithIdp` — federated sign-in with a Google ID token
//! - secure token `token` — refresh

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Response;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::provider::{AuthProvider, IdpCredential, ProviderError, ProviderSession};
use crate::config::FirebaseSettings;
use crate::models::{Identity, ProviderTokens};

/// HTTP connect timeout for provider calls.
const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// HTTP total timeout for provider calls.
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
/// Token lifetime assumed when the provider omits `expiresIn`.
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Firebase Authentication client.
#[derive(Clone)]
pub struct FirebaseAuthProvider {
    client: reqwest::Client,
    api_key: SecretString,
    identity_url: String,
    secure_token_url: String,
}

impl FirebaseAuthProvider {
    /// Build a client for the configured Firebase project.
    pub fn new(settings: &FirebaseSettings) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            identity_url: settings.identity_url.trim_end_matches('/').to_string(),
            secure_token_url: settings.secure_token_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call_identity<B, R>(&self, method: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/accounts:{}", self.identity_url, method);
        debug!(method = %method, "Calling identity toolkit");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(method = %method, error = %e, "Identity toolkit request failed");
                ProviderError::new(format!("Network error: {}", e))
            })?;

        parse_response(response).await
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuthProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let response: AccountResponse = self
            .call_identity(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        response.into_session()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let response: AccountResponse = self
            .call_identity(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        response.into_session()
    }

    async fn update_display_name(
        &self,
        session: &ProviderSession,
        display_name: &str,
    ) -> Result<Identity, ProviderError> {
        let response: AccountResponse = self
            .call_identity(
                "update",
                &UpdateProfileRequest {
                    id_token: session.tokens.id_token.expose_secret(),
                    display_name,
                    return_secure_token: false,
                },
            )
            .await?;

        Ok(Identity {
            uid: response.local_id,
            email: response.email.or_else(|| session.identity.email.clone()),
            display_name: non_empty(response.display_name),
        })
    }

    async fn sign_in_with_idp(
        &self,
        credential: &IdpCredential,
    ) -> Result<ProviderSession, ProviderError> {
        let post_body = format!(
            "id_token={}&providerId={}",
            urlencoding::encode(credential.id_token.expose_secret()),
            urlencoding::encode(&credential.provider_id),
        );

        let response: AccountResponse = self
            .call_identity(
                "signInWithIdp",
                &IdpRequest {
                    post_body: &post_body,
                    request_uri: &credential.request_uri,
                    return_secure_token: true,
                    return_idp_credential: true,
                },
            )
            .await?;
        response.into_session()
    }

    async fn refresh(&self, tokens: &ProviderTokens) -> Result<ProviderTokens, ProviderError> {
        let url = format!("{}/token", self.secure_token_url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", tokens.refresh_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Secure token request failed");
                ProviderError::new(format!("Network error: {}", e))
            })?;

        let refreshed: RefreshResponse = parse_response(response).await?;

        Ok(ProviderTokens {
            id_token: SecretString::from(refreshed.id_token),
            refresh_token: SecretString::from(refreshed.refresh_token),
            expires_at: expires_at(refreshed.expires_in.as_deref()),
        })
    }

    fn backend(&self) -> &'static str {
        "firebase"
    }
}

/// Decode a success body, or turn the provider's error body into its message.
async fn parse_response<R: DeserializeOwned>(response: Response) -> Result<R, ProviderError> {
    let status = response.status();

    if status.is_success() {
        return response.json::<R>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse provider response");
            ProviderError::new("Unexpected response from the authentication provider")
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("Authentication provider returned {}", status));

    debug!(status = %status, message = %message, "Provider rejected request");
    Err(ProviderError::new(message))
}

fn expires_at(expires_in: Option<&str>) -> chrono::DateTime<Utc> {
    let secs = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
    Utc::now() + Duration::seconds(secs)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: &'a str,
    request_uri: &'a str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

impl AccountResponse {
    fn into_session(self) -> Result<ProviderSession, ProviderError> {
        let (Some(id_token), Some(refresh_token)) = (self.id_token, self.refresh_token) else {
            return Err(ProviderError::new(
                "Authentication provider did not return a session",
            ));
        };

        Ok(ProviderSession {
            identity: Identity {
                uid: self.local_id,
                email: self.email,
                display_name: non_empty(self.display_name),
            },
            tokens: ProviderTokens {
                id_token: SecretString::from(id_token),
                refresh_token: SecretString::from(refresh_token),
                expires_at: expires_at(self.expires_in.as_deref()),
            },
        })
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}
