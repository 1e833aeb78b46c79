//! Health check endpoints.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthProvider;
use crate::services::store::RecordStore;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    /// `firebase` or `in-memory`.
    auth_provider: &'static str,
    /// `firebase` or `in-memory`.
    record_store: &'static str,
}

/// Health check endpoint.
///
/// GET /api/v1/health
/// Returns 200 if the service is running.
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check endpoint.
///
/// GET /api/v1/ready
/// Reports which authentication provider and record store back the server.
#[get("/ready")]
pub async fn ready(
    provider: web::Data<dyn AuthProvider>,
    store: web::Data<dyn RecordStore>,
) -> HttpResponse {
    HttpResponse::Ok().json(ReadyResponse {
        status: "ready",
        auth_provider: provider.backend(),
        record_store: store.backend(),
    })
}

/// Configure health routes.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
