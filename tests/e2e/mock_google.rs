//! Mock Google OAuth token endpoint for E2E tests.
//!
//! Starts an in-process HTTP server answering the authorization-code
//! exchange. The code doubles as the ID token so the in-memory provider
//! signs in the account whose email is the code; the code `deny` is refused.

use actix_web::{App, HttpResponse, HttpServer, post, web};
use serde::Deserialize;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Authorization code the mock refuses.
pub const DENIED_CODE: &str = "deny";

#[derive(Deserialize)]
struct TokenForm {
    code: String,
    grant_type: String,
    client_id: String,
}

#[post("/token")]
async fn token_endpoint(
    form: web::Form<TokenForm>,
    exchanges: web::Data<Arc<AtomicUsize>>,
) -> HttpResponse {
    exchanges.fetch_add(1, Ordering::SeqCst);

    if form.grant_type != "authorization_code" || form.client_id != "test-client" {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "invalid_request",
        }));
    }
    if form.code == DENIED_CODE {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Bad Request",
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({
        "access_token": "mock-access-token",
        "id_token": form.code,
        "token_type": "Bearer",
        "expires_in": 3599,
    }))
}

/// Mock Google token server.
pub struct MockGoogle {
    pub token_url: String,
    exchanges: Arc<AtomicUsize>,
}

impl MockGoogle {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let exchanges = Arc::new(AtomicUsize::new(0));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let token_url = format!("http://127.0.0.1:{}/token", port);

        let counter = exchanges.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(counter.clone()))
                .service(token_endpoint)
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Lives as long as the test's runtime.
        tokio::spawn(server);

        MockGoogle {
            token_url,
            exchanges,
        }
    }

    /// Number of code exchanges received.
    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}
