//! Email/password sign-in, sign-up and sign-out.
//!
//! - `GET /login`, `GET /signup` — render the forms
//! - `POST /login` — verify credentials, `303` to `/` or re-render with the error
//! - `POST /signup` — local checks, create the account, attach the display name
//! - `POST /logout` — clear the browser's identity, `303` to `/`
//!
//! Local checks run before the identity gate, and the gate before the
//! provider: a refused attempt never costs a remote call.

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{AuthProvider, BrowserSession, ProviderError};
use crate::models::{Identity, SessionId};
use crate::services::federated::GoogleOAuthClient;
use crate::services::session::{AttemptKind, SessionRegistry};
use crate::views::auth_forms::{self, FormEcho};

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Why a credential attempt did not sign anyone in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Please enter your email and password")]
    MissingCredentials,

    #[error("Please enter your email address")]
    MissingEmail,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Another sign-in attempt is already in progress")]
    AttemptInProgress,

    /// Shown verbatim.
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    /// Checks made before anything is sent to the provider, in order.
    fn check(&self) -> Result<(), CredentialError> {
        if self.password != self.confirm_password {
            return Err(CredentialError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(CredentialError::PasswordTooShort);
        }
        if self.email.trim().is_empty() {
            return Err(CredentialError::MissingEmail);
        }
        Ok(())
    }
}

/// Sign a browser session in with email and password.
pub async fn sign_in(
    registry: &SessionRegistry,
    provider: &dyn AuthProvider,
    session: &SessionId,
    form: &SignInForm,
) -> Result<Identity, CredentialError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Err(CredentialError::MissingCredentials);
    }

    let _attempt = registry
        .begin_attempt(session, AttemptKind::Password)
        .ok_or(CredentialError::AttemptInProgress)?;

    let signed_in = provider.sign_in_with_password(email, &form.password).await?;
    let identity = signed_in.identity.clone();
    registry.establish(session, signed_in);
    Ok(identity)
}

/// Create an account, sign it in and attach the display name when given.
///
/// A failed display-name update leaves the new account signed in and
/// reports the provider's message.
pub async fn sign_up(
    registry: &SessionRegistry,
    provider: &dyn AuthProvider,
    session: &SessionId,
    form: &SignUpForm,
) -> Result<Identity, CredentialError> {
    form.check()?;

    let _attempt = registry
        .begin_attempt(session, AttemptKind::Password)
        .ok_or(CredentialError::AttemptInProgress)?;

    let created = provider.sign_up(form.email.trim(), &form.password).await?;
    let mut identity = created.identity.clone();
    registry.establish(session, created.clone());

    let name = form.name.trim();
    if !name.is_empty() {
        identity = provider.update_display_name(&created, name).await?;
        registry.update_identity(session, identity.clone());
    }
    Ok(identity)
}

/// Sign a browser session out. Provider failures are logged only.
pub async fn sign_out(registry: &SessionRegistry, provider: &dyn AuthProvider, session: &SessionId) {
    if let Some(tokens) = registry.clear(session)
        && let Err(e) = provider.sign_out(&tokens).await
    {
        warn!(session = %session, error = %e, "Provider sign-out failed");
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login_page)
        .service(login)
        .service(signup_page)
        .service(signup)
        .service(logout);
}

#[get("/login")]
async fn login_page(
    session: BrowserSession,
    registry: web::Data<SessionRegistry>,
    google: Option<web::Data<GoogleOAuthClient>>,
) -> HttpResponse {
    let identity = registry.current(&session.id);
    session.page(auth_forms::login(
        identity.as_ref(),
        &FormEcho::default(),
        google.is_some(),
    ))
}

#[post("/login")]
async fn login(
    session: BrowserSession,
    form: web::Form<SignInForm>,
    registry: web::Data<SessionRegistry>,
    provider: web::Data<dyn AuthProvider>,
    google: Option<web::Data<GoogleOAuthClient>>,
) -> HttpResponse {
    match sign_in(&registry, provider.get_ref(), &session.id, &form).await {
        Ok(_) => session.redirect("/"),
        Err(e) => {
            info!(session = %session.id, reason = %e, "Sign-in failed");
            let message = e.to_string();
            let echo = FormEcho {
                email: &form.email,
                error: Some(&message),
                ..FormEcho::default()
            };
            let identity = registry.current(&session.id);
            session.page(auth_forms::login(identity.as_ref(), &echo, google.is_some()))
        }
    }
}

#[get("/signup")]
async fn signup_page(
    session: BrowserSession,
    registry: web::Data<SessionRegistry>,
    google: Option<web::Data<GoogleOAuthClient>>,
) -> HttpResponse {
    let identity = registry.current(&session.id);
    session.page(auth_forms::signup(
        identity.as_ref(),
        &FormEcho::default(),
        google.is_some(),
    ))
}

#[post("/signup")]
async fn signup(
    session: BrowserSession,
    form: web::Form<SignUpForm>,
    registry: web::Data<SessionRegistry>,
    provider: web::Data<dyn AuthProvider>,
    google: Option<web::Data<GoogleOAuthClient>>,
) -> HttpResponse {
    match sign_up(&registry, provider.get_ref(), &session.id, &form).await {
        Ok(_) => session.redirect("/"),
        Err(e) => {
            info!(session = %session.id, reason = %e, "Sign-up failed");
            let message = e.to_string();
            let echo = FormEcho {
                name: &form.name,
                email: &form.email,
                error: Some(&message),
            };
            let identity = registry.current(&session.id);
            session.page(auth_forms::signup(identity.as_ref(), &echo, google.is_some()))
        }
    }
}

#[post("/logout")]
async fn logout(
    session: BrowserSession,
    registry: web::Data<SessionRegistry>,
    provider: web::Data<dyn AuthProvider>,
) -> HttpResponse {
    sign_out(&registry, provider.get_ref(), &session.id).await;
    session.redirect("/")
}
