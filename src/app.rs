//! Shared application state and route wiring.
//!
//! `main` and the end-to-end tests build the same [`AppContext`] and mount it
//! with [`AppContext::configure`], so both exercise identical routing.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use tokio::sync::Semaphore;

use crate::api;
use crate::auth::AuthProvider;
use crate::config::{SessionSettings, UploadSettings};
use crate::services::store::RecordStore;
use crate::services::upload::{self, UploadBoard};
use crate::services::{self, EventBroadcaster, GoogleOAuthClient, SessionRegistry};

/// Everything handlers receive through `web::Data`.
#[derive(Clone)]
pub struct AppContext {
    pub session_settings: web::Data<SessionSettings>,
    pub registry: web::Data<SessionRegistry>,
    pub provider: web::Data<dyn AuthProvider>,
    pub store: web::Data<dyn RecordStore>,
    pub broadcaster: web::Data<EventBroadcaster>,
    pub board: web::Data<UploadBoard>,
    pub upload_semaphore: web::Data<Semaphore>,
    /// `None` disables federated sign-in.
    pub google: Option<web::Data<GoogleOAuthClient>>,
}

impl AppContext {
    pub fn new(
        session_settings: SessionSettings,
        upload_settings: &UploadSettings,
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn RecordStore>,
        google: Option<GoogleOAuthClient>,
    ) -> Self {
        let broadcaster = EventBroadcaster::new();
        let board = UploadBoard::new(
            broadcaster.clone(),
            Duration::from_millis(upload_settings.success_display_ms),
        );

        Self {
            session_settings: web::Data::new(session_settings),
            registry: web::Data::new(SessionRegistry::new()),
            provider: web::Data::from(provider),
            store: web::Data::from(store),
            broadcaster: web::Data::new(broadcaster),
            board: web::Data::new(board),
            upload_semaphore: web::Data::new(Semaphore::new(
                upload_settings.max_concurrent_uploads.max(1),
            )),
            google: google.map(web::Data::new),
        }
    }

    /// Register shared state and every route.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.session_settings.clone())
            .app_data(self.registry.clone())
            .app_data(self.provider.clone())
            .app_data(self.store.clone())
            .app_data(self.broadcaster.clone())
            .app_data(self.board.clone())
            .app_data(self.upload_semaphore.clone());

        if let Some(google) = &self.google {
            cfg.app_data(google.clone());
        }

        cfg.service(
            web::scope("/api/v1")
                .configure(api::configure_health_routes)
                .configure(api::configure_session_routes)
                .configure(upload::configure_api_routes)
                .configure(api::configure_websocket_routes),
        )
        .configure(api::configure_page_routes)
        .configure(services::configure_credential_routes)
        .configure(services::configure_federated_routes)
        .configure(upload::configure_page_routes);
    }
}
