//! E2E tests: Google sign-in through a mock token endpoint.

use actix_web::cookie::Cookie;
use actix_web::test;

use super::mock_google::{DENIED_CODE, MockGoogle};
use super::test_helpers::*;

const STATE_COOKIE: &str = "tcc_oauth_state";
const AUTHORIZE_URL: &str = "https://accounts.example.test/o/oauth2/v2/auth";

/// Start the flow; returns the state cookie and the `state` sent to Google.
async fn begin_google<S: TestService>(
    app: &S,
    cookie: &Cookie<'static>,
    from: &str,
) -> (Cookie<'static>, String) {
    let req = test::TestRequest::get()
        .uri(&format!("/auth/google?from={from}"))
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 303);

    let target = location(&resp).expect("redirect to Google");
    assert!(target.starts_with(AUTHORIZE_URL), "unexpected target {target}");
    assert!(target.contains("client_id=test-client"));
    assert!(target.contains("response_type=code"));

    let state = target
        .split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("state="))
        .expect("state parameter")
        .to_string();
    let state_cookie = response_cookie(&resp, STATE_COOKIE).expect("state cookie");
    assert!(state_cookie.value().ends_with(&state));

    (state_cookie, state)
}

async fn callback<S: TestService>(
    app: &S,
    cookie: &Cookie<'static>,
    state_cookie: &Cookie<'static>,
    query: &str,
) -> actix_web::dev::ServiceResponse {
    let req = test::TestRequest::get()
        .uri(&format!("/auth/google/callback?{query}"))
        .cookie(cookie.clone())
        .cookie(state_cookie.clone())
        .to_request();
    test::call_service(app, req).await
}

/// 1. Start from the sign-in page, Google redirects back with a code
/// 2. Code exchanged, account signed in, redirected home
/// 3. State cookie cleared
#[actix_rt::test]
async fn test_google_sign_in_flow() {
    let google = MockGoogle::start().await;
    let env = TestEnv::with_google(&google.token_url);
    let uid = env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let (state_cookie, state) = begin_google(&app, &cookie, "login").await;

    let resp = callback(
        &app,
        &cookie,
        &state_cookie,
        &format!("code={}&state={state}", urlencoding::encode(TEST_EMAIL)),
    )
    .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    let cleared = response_cookie(&resp, STATE_COOKIE).expect("state cookie cleared");
    assert_eq!(cleared.value(), "");

    assert_eq!(google.exchange_count(), 1);
    let session = current_session(&app, &cookie).await;
    assert_eq!(session["signed_in"], true);
    assert_eq!(session["user"]["uid"], uid.as_str());
}

/// The gate stays closed across the redirect.
#[actix_rt::test]
async fn test_password_sign_in_refused_during_google_flow() {
    let google = MockGoogle::start().await;
    let env = TestEnv::with_google(&google.token_url);
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let (state_cookie, state) = begin_google(&app, &cookie, "login").await;

    let resp = post_login(&app, &cookie, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(resp.status(), 200);
    assert!(body_text(resp).await.contains("Another sign-in attempt is already in progress"));
    assert_eq!(env.provider.call_count(), 0);

    // Callback releases the gate even when it fails.
    let resp = callback(&app, &cookie, &state_cookie, &format!("error=access_denied&state={state}")).await;
    assert_eq!(resp.status(), 200);
    assert!(body_text(resp).await.contains("Google sign-in failed: access_denied"));

    let resp = post_login(&app, &cookie, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(resp.status(), 303);
}

/// A callback whose state does not match the cookie is refused before any exchange.
#[actix_rt::test]
async fn test_state_mismatch_is_refused() {
    let google = MockGoogle::start().await;
    let env = TestEnv::with_google(&google.token_url);
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let (state_cookie, _) = begin_google(&app, &cookie, "signup").await;

    let resp = callback(&app, &cookie, &state_cookie, "code=ana%40example.com&state=forged").await;
    assert_eq!(resp.status(), 200);
    let page = body_text(resp).await;
    assert!(page.contains("Google sign-in could not be verified. Please try again."));
    // Shown on the form the flow started from.
    assert!(page.contains(r#"name="confirm_password""#));

    assert_eq!(google.exchange_count(), 0);
    assert_eq!(current_session(&app, &cookie).await["signed_in"], false);
}

/// Google refusing the code is reported with its description.
#[actix_rt::test]
async fn test_refused_code_is_reported() {
    let google = MockGoogle::start().await;
    let env = TestEnv::with_google(&google.token_url);
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let (state_cookie, state) = begin_google(&app, &cookie, "login").await;

    let resp = callback(&app, &cookie, &state_cookie, &format!("code={DENIED_CODE}&state={state}")).await;
    assert_eq!(resp.status(), 200);
    assert!(body_text(resp).await.contains("Google sign-in failed: Bad Request"));

    assert_eq!(google.exchange_count(), 1);
    assert_eq!(env.provider.call_count(), 0);
    assert_eq!(current_session(&app, &cookie).await["signed_in"], false);
}

/// A new Google account is created on first sign-in.
#[actix_rt::test]
async fn test_first_google_sign_in_creates_account() {
    let google = MockGoogle::start().await;
    let env = TestEnv::with_google(&google.token_url);
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let (state_cookie, state) = begin_google(&app, &cookie, "signup").await;
    let resp = callback(
        &app,
        &cookie,
        &state_cookie,
        &format!("code=new%40example.com&state={state}"),
    )
    .await;
    assert_eq!(resp.status(), 303);

    let session = current_session(&app, &cookie).await;
    assert_eq!(session["user"]["email"], "new@example.com");
}

/// Without OAuth settings the link is hidden and the route explains why.
#[actix_rt::test]
async fn test_google_not_configured() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let req = test::TestRequest::get().uri("/login").cookie(cookie.clone()).to_request();
    let page = body_text(test::call_service(&app, req).await).await;
    assert!(!page.contains("/auth/google"));

    let req = test::TestRequest::get()
        .uri("/auth/google?from=login")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert!(body_text(resp).await.contains("Google sign-in is not configured"));
}
