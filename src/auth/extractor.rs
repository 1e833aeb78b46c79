//! Actix-web extractor for the browser session cookie.
//!
//! Every page and API handler takes a [`BrowserSession`]. A missing, expired
//! or forged cookie silently starts a new anonymous session; the handler then
//! attaches the fresh cookie to its response.

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::dev::Payload;
use actix_web::http::header::{self, ContentType};
use actix_web::{FromRequest, HttpRequest, HttpResponse, HttpResponseBuilder, web};
use std::future::{Ready, ready};
use tracing::debug;

use super::token::{create_session_token, verify_session_token};
use crate::config::{SESSION_COOKIE, SessionSettings};
use crate::error::AppError;
use crate::models::SessionId;
use crate::services::session::SessionRegistry;

/// Build the session cookie carrying a signed `session_id`.
pub fn session_cookie(
    session_id: &SessionId,
    settings: &SessionSettings,
) -> Result<Cookie<'static>, AppError> {
    let token = create_session_token(session_id, &settings.secret, settings.ttl_secs)
        .map_err(|e| AppError::Internal(format!("Failed to sign session cookie: {}", e)))?;

    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(settings.secure_cookies);
    cookie.set_max_age(time::Duration::seconds(settings.ttl_secs as i64));
    Ok(cookie)
}

/// The browser session a request belongs to.
pub struct BrowserSession {
    pub id: SessionId,
    /// Cookie to send back when the session was created by this request.
    cookie: Option<Cookie<'static>>,
}

impl BrowserSession {
    /// Whether this request started the session.
    pub fn is_new(&self) -> bool {
        self.cookie.is_some()
    }

    /// Attach the session cookie to a response when the session is new.
    pub fn apply<'b>(&self, response: &'b mut HttpResponseBuilder) -> &'b mut HttpResponseBuilder {
        if let Some(cookie) = &self.cookie {
            response.cookie(cookie.clone());
        }
        response
    }

    /// `303 See Other` to `location`.
    pub fn redirect(&self, location: &str) -> HttpResponse {
        self.apply(&mut HttpResponse::SeeOther())
            .insert_header((header::LOCATION, location))
            .finish()
    }

    /// `200 OK` with a rendered page.
    pub fn page(&self, html: String) -> HttpResponse {
        self.apply(&mut HttpResponse::Ok())
            .content_type(ContentType::html())
            .body(html)
    }

    fn resolve(req: &HttpRequest) -> Result<Self, AppError> {
        let settings = req
            .app_data::<web::Data<SessionSettings>>()
            .ok_or_else(|| AppError::Internal("Session settings not configured".to_string()))?;
        let registry = req
            .app_data::<web::Data<SessionRegistry>>()
            .ok_or_else(|| AppError::Internal("Session registry not configured".to_string()))?;

        let cookie_id = req.cookie(SESSION_COOKIE).and_then(|cookie| {
            verify_session_token(cookie.value(), &settings.secret)
                .map_err(|e| debug!(error = %e, "Ignoring session cookie"))
                .ok()
        });

        let (id, created) = registry.resolve(cookie_id);
        let cookie = if created {
            Some(session_cookie(&id, settings)?)
        } else {
            None
        };

        Ok(Self { id, cookie })
    }
}

impl FromRequest for BrowserSession {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::resolve(req))
    }
}
