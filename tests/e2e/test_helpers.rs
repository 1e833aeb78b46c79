//! Shared test helpers for E2E tests.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::{App, test};
use secrecy::SecretString;
use serde_json::Value;

use tcc_predictor_lib::app::AppContext;
use tcc_predictor_lib::auth::InMemoryAuthProvider;
use tcc_predictor_lib::auth::token::verify_session_token;
use tcc_predictor_lib::config::{GoogleOAuthSettings, SESSION_COOKIE, SessionSettings, UploadSettings};
use tcc_predictor_lib::models::SessionId;
use tcc_predictor_lib::services::GoogleOAuthClient;
use tcc_predictor_lib::services::store::MemoryRecordStore;

pub const TEST_SESSION_SECRET: &str = "test-session-secret-for-e2e";
pub const TEST_EMAIL: &str = "ana@example.com";
pub const TEST_PASSWORD: &str = "hunter22";

/// Success display window used by the tests.
pub const DISPLAY_WINDOW_MS: u64 = 200;

const BOUNDARY: &str = "----tcc-e2e-boundary";

/// Test service type.
pub trait TestService:
    actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
}

impl<S> TestService for S where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >
{
}

/// Application context plus handles on its fake collaborators.
pub struct TestEnv {
    pub context: AppContext,
    pub provider: Arc<InMemoryAuthProvider>,
    pub store: Arc<MemoryRecordStore>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::build(InMemoryAuthProvider::new(), None)
    }

    /// Provider whose tokens expire immediately, so every use triggers a refresh.
    pub fn with_expired_tokens() -> Self {
        Self::build(
            InMemoryAuthProvider::with_token_ttl(chrono::Duration::seconds(-60)),
            None,
        )
    }

    /// Federated sign-in enabled against a mock token endpoint.
    pub fn with_google(token_url: &str) -> Self {
        let settings = GoogleOAuthSettings {
            client_id: "test-client".to_string(),
            client_secret: SecretString::from("test-client-secret".to_string()),
            redirect_url: "http://localhost:8080/auth/google/callback".to_string(),
            authorize_url: "https://accounts.example.test/o/oauth2/v2/auth".to_string(),
            token_url: token_url.to_string(),
        };
        let google = GoogleOAuthClient::new(settings).expect("failed to build OAuth client");
        Self::build(InMemoryAuthProvider::new(), Some(google))
    }

    fn build(provider: InMemoryAuthProvider, google: Option<GoogleOAuthClient>) -> Self {
        let provider = Arc::new(provider);
        let store = Arc::new(MemoryRecordStore::new());
        let context = AppContext::new(
            session_settings(),
            &UploadSettings {
                success_display_ms: DISPLAY_WINDOW_MS,
                max_concurrent_uploads: 4,
            },
            provider.clone(),
            store.clone(),
            google,
        );
        Self {
            context,
            provider,
            store,
        }
    }

    /// Seed the default test account; returns its uid.
    pub fn add_test_account(&self) -> String {
        self.provider.add_account(TEST_EMAIL, TEST_PASSWORD, Some("Ana"))
    }

    /// Browser session id carried by a session cookie.
    pub fn session_id(&self, cookie: &Cookie<'_>) -> SessionId {
        verify_session_token(cookie.value(), &self.context.session_settings.secret)
            .expect("session cookie should verify")
    }
}

pub fn session_settings() -> SessionSettings {
    SessionSettings {
        secret: SecretString::from(TEST_SESSION_SECRET.to_string()),
        ttl_secs: 3600,
        idle_secs: 3600,
        secure_cookies: false,
    }
}

/// Create a test app with every route.
pub async fn create_test_app(env: &TestEnv) -> impl TestService {
    test::init_service(App::new().configure(|cfg| env.context.configure(cfg))).await
}

/// Cookie named `name` set by a response.
pub fn response_cookie(resp: &ServiceResponse, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
}

pub fn location(resp: &ServiceResponse) -> Option<String> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Open a browser session by visiting the landing page.
pub async fn start_session<S: TestService>(app: &S) -> Cookie<'static> {
    let resp = test::call_service(app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), 200);
    response_cookie(&resp, SESSION_COOKIE).expect("first visit should set a session cookie")
}

/// Submit the sign-in form.
pub async fn post_login<S: TestService>(
    app: &S,
    cookie: &Cookie<'static>,
    email: &str,
    password: &str,
) -> ServiceResponse {
    let req = test::TestRequest::post()
        .uri("/login")
        .cookie(cookie.clone())
        .set_form([("email", email), ("password", password)])
        .to_request();
    test::call_service(app, req).await
}

/// Open a browser session signed in as the default test account.
pub async fn signed_in_session<S: TestService>(app: &S) -> Cookie<'static> {
    let cookie = start_session(app).await;
    let resp = post_login(app, &cookie, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(resp.status(), 303, "sign-in should redirect");
    assert_eq!(location(&resp).as_deref(), Some("/"));
    cookie
}

/// One file of a multipart upload.
pub struct TestFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl TestFile {
    pub fn new(name: &str, content_type: &str, size: usize) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            data: (0..size).map(|i| (i % 251) as u8).collect(),
        }
    }

    pub fn png(name: &str, size: usize) -> Self {
        Self::new(name, "image/png", size)
    }

    pub fn jpeg(name: &str, size: usize) -> Self {
        Self::new(name, "image/jpeg", size)
    }
}

/// `multipart/form-data` body with an optional `mode` field and `files` parts.
pub fn multipart_body(mode: Option<&str>, files: &[TestFile]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    if let Some(mode) = mode {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"mode\"\r\n\r\n{mode}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

async fn post_multipart<S: TestService>(
    app: &S,
    uri: &str,
    cookie: Option<&Cookie<'static>>,
    mode: Option<&str>,
    files: &[TestFile],
) -> ServiceResponse {
    let (content_type, body) = multipart_body(mode, files);
    let mut req = test::TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    test::call_service(app, req.to_request()).await
}

/// Submit the tools page upload form.
pub async fn post_upload_form<S: TestService>(
    app: &S,
    cookie: Option<&Cookie<'static>>,
    mode: &str,
    files: &[TestFile],
) -> ServiceResponse {
    post_multipart(app, "/tools/upload", cookie, Some(mode), files).await
}

/// Upload through the JSON API; returns status and body.
pub async fn post_upload_json<S: TestService>(
    app: &S,
    cookie: Option<&Cookie<'static>>,
    mode: &str,
    files: &[TestFile],
) -> (u16, Value) {
    let resp = post_multipart(app, "/api/v1/uploads", cookie, Some(mode), files).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// Upload state of a browser session.
pub async fn upload_state<S: TestService>(app: &S, cookie: &Cookie<'static>) -> Value {
    let req = test::TestRequest::get()
        .uri("/api/v1/uploads/state")
        .cookie(cookie.clone())
        .to_request();
    test::call_and_read_body_json(app, req).await
}

/// Identity snapshot of a browser session.
pub async fn current_session<S: TestService>(app: &S, cookie: &Cookie<'static>) -> Value {
    let req = test::TestRequest::get()
        .uri("/api/v1/session")
        .cookie(cookie.clone())
        .to_request();
    test::call_and_read_body_json(app, req).await
}

/// Rendered page body as text.
pub async fn body_text(resp: ServiceResponse) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8_lossy(&bytes).into_owned()
}
