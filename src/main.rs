//! TCC Predictor server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, http::header};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use tcc_predictor_lib::app::AppContext;
use tcc_predictor_lib::auth::{AuthProvider, FirebaseAuthProvider, InMemoryAuthProvider};
use tcc_predictor_lib::config::Config;
use tcc_predictor_lib::middleware::RequestLogger;
use tcc_predictor_lib::services::store::{FirebaseRecordStore, MemoryRecordStore, RecordStore};
use tcc_predictor_lib::services::{self, CleanupConfig, GoogleOAuthClient};

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

/// Remote collaborators for the configured environment.
fn collaborators(
    config: &Config,
) -> reqwest::Result<(Arc<dyn AuthProvider>, Arc<dyn RecordStore>)> {
    match &config.firebase {
        Some(firebase) => {
            info!("Using Firebase project at {}", firebase.database_url);
            Ok((
                Arc::new(FirebaseAuthProvider::new(firebase)?),
                Arc::new(FirebaseRecordStore::new(firebase)?),
            ))
        }
        None => {
            warn!("No Firebase project configured - accounts and uploads are kept in memory");
            Ok((
                Arc::new(InMemoryAuthProvider::new()),
                Arc::new(MemoryRecordStore::new()),
            ))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, FIREBASE_API_KEY and FIREBASE_DATABASE_URL must be set");
            error!("  - In production, TCC_SESSION_SECRET must not match the development default");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  TCC Predictor");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let (provider, store) = collaborators(&config).expect("Failed to build HTTP client");
    let google = match config.google_oauth.clone() {
        Some(settings) => {
            info!("Google sign-in enabled (callback: {})", settings.redirect_url);
            Some(GoogleOAuthClient::new(settings).expect("Failed to build HTTP client for OAuth"))
        }
        None => {
            info!("Google sign-in disabled (GOOGLE_CLIENT_ID not set)");
            None
        }
    };

    let context = AppContext::new(
        config.session.clone(),
        &config.upload,
        provider,
        store,
        google,
    );

    // Start the cleanup background task
    let cleanup_config = CleanupConfig::for_idle(Duration::from_secs(config.session.idle_secs));
    services::start_cleanup_task(
        context.registry.clone().into_inner(),
        context.board.get_ref().clone(),
        cleanup_config,
    );

    info!(
        "Upload limits: 10MB per file, {} concurrent uploads, success shown for {}ms",
        config.upload.max_concurrent_uploads, config.upload.success_display_ms
    );

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = if is_development {
            // Frontend dev server
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .supports_credentials()
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let mut app = App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(RequestLogger)
            .configure(|cfg| context.configure(cfg));

        if let Some(ref dir) = static_dir {
            app = app.service(Files::new("/assets", dir.join("assets")).prefer_utf8(true));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
