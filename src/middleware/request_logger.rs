//! Request logging middleware.
//!
//! One line per request on the `http` target. Only the presence of the
//! session cookie is logged, never its value; uploads also log their
//! declared body size.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::{StatusCode, header};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SESSION_COOKIE;

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

/// What is known about a request before it is handled.
struct RequestLine {
    method: String,
    path: String,
    session_cookie: bool,
    content_length: Option<u64>,
    started: Instant,
}

impl RequestLine {
    fn of(req: &ServiceRequest) -> Self {
        Self {
            method: req.method().to_string(),
            path: req.path().to_string(),
            session_cookie: req.cookie(SESSION_COOKIE).is_some(),
            content_length: req
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok()),
            started: Instant::now(),
        }
    }

    fn finish(&self, status: StatusCode) {
        let status_code = status.as_u16();
        let duration_ms = self.started.elapsed().as_millis() as u64;

        match status {
            s if s.is_server_error() => error!(
                target: "http",
                method = %self.method,
                path = %self.path,
                status = status_code,
                duration_ms,
                "Request failed"
            ),
            s if s.is_client_error() => warn!(
                target: "http",
                method = %self.method,
                path = %self.path,
                status = status_code,
                duration_ms,
                session_cookie = self.session_cookie,
                "Request refused"
            ),
            _ => info!(
                target: "http",
                method = %self.method,
                path = %self.path,
                status = status_code,
                duration_ms,
                session_cookie = self.session_cookie,
                "Request completed"
            ),
        }
    }
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let line = RequestLine::of(&req);
        debug!(
            target: "http",
            method = %line.method,
            path = %line.path,
            content_length = ?line.content_length,
            session_cookie = line.session_cookie,
            "Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            line.finish(res.status());
            Ok(res)
        })
    }
}
