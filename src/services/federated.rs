//! Google sign-in via the OAuth authorization-code flow.
//!
//! 1. `GET /auth/google?from=login|signup` — claim the identity gate, set the
//!    CSRF `state` cookie and redirect to Google
//! 2. `GET /auth/google/callback?code=...&state=...` — verify state, exchange
//!    the code for a Google ID token, sign in with the authentication provider
//!
//! The gate stays closed across the redirect and is released when the
//! callback resolves, or after [`ATTEMPT_TIMEOUT`] when it never arrives.
//! Failures re-render the form the flow started from.

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::{HttpRequest, HttpResponse, get, web};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::auth::{AuthProvider, BrowserSession, IdpCredential};
use crate::config::{GoogleOAuthSettings, SessionSettings};
use crate::models::SessionId;
use crate::services::credentials::CredentialError;
use crate::services::session::{ATTEMPT_TIMEOUT, AttemptKind, SessionRegistry};
use crate::views::auth_forms::{self, FormEcho};

/// CSRF state cookie: `{origin}:{random state}`.
const OAUTH_STATE_COOKIE: &str = "tcc_oauth_state";
const GOOGLE_PROVIDER_ID: &str = "google.com";
const SCOPES: &str = "openid email profile";

const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FederatedError {
    #[error("Google sign-in is not configured")]
    NotConfigured,

    #[error("Google sign-in could not be verified. Please try again.")]
    StateMismatch,

    /// Google answered the authorization request with an error (e.g. `access_denied`).
    #[error("Google sign-in failed: {0}")]
    Denied(String),

    #[error("Google sign-in failed: {0}")]
    Exchange(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Form the flow was started from; failures are shown there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Login,
    Signup,
}

impl Origin {
    fn parse(s: &str) -> Self {
        match s {
            "signup" => Origin::Signup,
            _ => Origin::Login,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Origin::Login => "login",
            Origin::Signup => "signup",
        }
    }
}

/// Google OAuth client.
pub struct GoogleOAuthClient {
    client: reqwest::Client,
    settings: GoogleOAuthSettings,
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl GoogleOAuthClient {
    pub fn new(settings: GoogleOAuthSettings) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, settings })
    }

    /// Consent screen URL carrying `state`.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
            self.settings.authorize_url,
            urlencoding::encode(&self.settings.client_id),
            urlencoding::encode(&self.settings.redirect_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for a Google ID token.
    pub async fn exchange_code(&self, code: &str) -> Result<SecretString, FederatedError> {
        let response: TokenResponse = self
            .client
            .post(&self.settings.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.expose_secret()),
                ("redirect_uri", self.settings.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Google code exchange request failed");
                FederatedError::Exchange(format!("Network error: {}", e))
            })?
            .json()
            .await
            .map_err(|e| {
                warn!(error = %e, "Google token response unreadable");
                FederatedError::Exchange("invalid token response".to_string())
            })?;

        if let Some(error) = response.error {
            warn!(error = %error, "Google rejected the authorization code");
            return Err(FederatedError::Exchange(
                response.error_description.unwrap_or(error),
            ));
        }

        response.id_token.map(SecretString::from).ok_or_else(|| {
            warn!("Google token response has no id_token");
            FederatedError::Exchange("no ID token returned".to_string())
        })
    }

    fn redirect_url(&self) -> &str {
        &self.settings.redirect_url
    }
}

fn generate_state() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

fn state_cookie(value: String, settings: &SessionSettings, max_age: time::Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(OAUTH_STATE_COOKIE, value);
    cookie.set_path("/auth/google");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(settings.secure_cookies);
    cookie.set_max_age(max_age);
    cookie
}

/// Split a state cookie value into its origin and random state.
fn parse_state_cookie(value: &str) -> Option<(Origin, &str)> {
    let (origin, state) = value.split_once(':')?;
    (!state.is_empty()).then(|| (Origin::parse(origin), state))
}

fn states_match(expected: &str, provided: &str) -> bool {
    !provided.is_empty() && bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
}

/// Complete a federated sign-in with the code Google returned.
pub async fn complete_sign_in(
    google: &GoogleOAuthClient,
    registry: &SessionRegistry,
    provider: &dyn AuthProvider,
    session: &SessionId,
    code: &str,
) -> Result<(), FederatedError> {
    let id_token = google.exchange_code(code).await?;
    let credential = IdpCredential {
        provider_id: GOOGLE_PROVIDER_ID.to_string(),
        id_token,
        request_uri: google.redirect_url().to_string(),
    };
    let signed_in = provider
        .sign_in_with_idp(&credential)
        .await
        .map_err(CredentialError::from)?;
    registry.establish(session, signed_in);
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(google_start).service(google_callback);
}

#[derive(Deserialize)]
pub struct StartQuery {
    pub from: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn render_failure(
    session: &BrowserSession,
    registry: &SessionRegistry,
    origin: Origin,
    error: &FederatedError,
    google_enabled: bool,
) -> String {
    info!(session = %session.id, origin = origin.as_str(), reason = %error, "Federated sign-in failed");
    let message = error.to_string();
    let echo = FormEcho {
        error: Some(&message),
        ..FormEcho::default()
    };
    let identity = registry.current(&session.id);
    match origin {
        Origin::Login => auth_forms::login(identity.as_ref(), &echo, google_enabled),
        Origin::Signup => auth_forms::signup(identity.as_ref(), &echo, google_enabled),
    }
}

/// Start Google sign-in.
///
/// GET /auth/google?from=login|signup
#[get("/auth/google")]
async fn google_start(
    session: BrowserSession,
    query: web::Query<StartQuery>,
    registry: web::Data<SessionRegistry>,
    settings: web::Data<SessionSettings>,
    google: Option<web::Data<GoogleOAuthClient>>,
) -> HttpResponse {
    let origin = query.from.as_deref().map_or(Origin::Login, Origin::parse);

    let Some(google) = google else {
        let page = render_failure(&session, &registry, origin, &FederatedError::NotConfigured, false);
        return session.page(page);
    };

    let Some(attempt) = registry.begin_attempt(&session.id, AttemptKind::Federated) else {
        let error = FederatedError::from(CredentialError::AttemptInProgress);
        return session.page(render_failure(&session, &registry, origin, &error, true));
    };
    // Held until the callback adopts it.
    attempt.detach();

    let state = generate_state();
    let max_age = time::Duration::seconds(ATTEMPT_TIMEOUT.as_secs() as i64);
    let cookie = state_cookie(format!("{}:{}", origin.as_str(), state), &settings, max_age);

    info!(session = %session.id, origin = origin.as_str(), "Redirecting to Google sign-in");
    session
        .apply(&mut HttpResponse::SeeOther())
        .cookie(cookie)
        .insert_header(("Location", google.authorize_url(&state)))
        .finish()
}

/// Google redirects back here.
///
/// GET /auth/google/callback?code=...&state=...
#[get("/auth/google/callback")]
async fn google_callback(
    req: HttpRequest,
    session: BrowserSession,
    query: web::Query<CallbackQuery>,
    registry: web::Data<SessionRegistry>,
    provider: web::Data<dyn AuthProvider>,
    settings: web::Data<SessionSettings>,
    google: Option<web::Data<GoogleOAuthClient>>,
) -> HttpResponse {
    let stored = req.cookie(OAUTH_STATE_COOKIE);
    let parsed = stored.as_ref().and_then(|c| parse_state_cookie(c.value()));
    let origin = parsed.map(|(origin, _)| origin).unwrap_or(Origin::Login);

    // Released when this handler returns.
    let _attempt = registry.adopt_attempt(&session.id, AttemptKind::Federated);

    let outcome = match (&google, parsed) {
        (None, _) => Err(FederatedError::NotConfigured),
        (Some(_), None) => {
            warn!(session = %session.id, "Google callback without state cookie");
            Err(FederatedError::StateMismatch)
        }
        (Some(google), Some((_, expected))) => {
            if !states_match(expected, query.state.as_deref().unwrap_or_default()) {
                warn!(session = %session.id, "Google callback state mismatch");
                Err(FederatedError::StateMismatch)
            } else if let Some(error) = &query.error {
                Err(FederatedError::Denied(error.clone()))
            } else {
                match query.code.as_deref() {
                    Some(code) if !code.is_empty() => {
                        complete_sign_in(google, &registry, provider.get_ref(), &session.id, code)
                            .await
                    }
                    _ => Err(FederatedError::Exchange("missing authorization code".to_string())),
                }
            }
        }
    };

    let clear = state_cookie(String::new(), &settings, time::Duration::ZERO);
    match outcome {
        Ok(()) => session
            .apply(&mut HttpResponse::SeeOther())
            .cookie(clear)
            .insert_header(("Location", "/"))
            .finish(),
        Err(error) => {
            let page = render_failure(&session, &registry, origin, &error, google.is_some());
            session
                .apply(&mut HttpResponse::Ok())
                .cookie(clear)
                .content_type(actix_web::http::header::ContentType::html())
                .body(page)
        }
    }
}
