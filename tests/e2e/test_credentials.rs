//! E2E tests: email/password sign-in, sign-up and sign-out.

use actix_web::test;

use tcc_predictor_lib::config::SESSION_COOKIE;

use super::test_helpers::*;

/// 1. Visit the site, sign in with the seeded account
/// 2. Redirected home, session reports the identity
/// 3. Pages show the signed-in header
#[actix_rt::test]
async fn test_sign_in_flow() {
    let env = TestEnv::new();
    let uid = env.add_test_account();
    let app = create_test_app(&env).await;

    let cookie = start_session(&app).await;
    let before = current_session(&app, &cookie).await;
    assert_eq!(before["signed_in"], false);
    assert!(before["user"].is_null());

    let resp = post_login(&app, &cookie, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp).as_deref(), Some("/"));

    let after = current_session(&app, &cookie).await;
    assert_eq!(after["signed_in"], true);
    assert_eq!(after["user"]["uid"], uid.as_str());
    assert_eq!(after["user"]["email"], TEST_EMAIL);

    let req = test::TestRequest::get().uri("/").cookie(cookie.clone()).to_request();
    let page = body_text(test::call_service(&app, req).await).await;
    assert!(page.contains("Sign Out"));
    assert!(page.contains(&format!(r#"data-uid="{uid}""#)));
}

/// Provider refusals are shown verbatim and the email is echoed back.
#[actix_rt::test]
async fn test_wrong_password_shows_provider_message() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let resp = post_login(&app, &cookie, TEST_EMAIL, "wrong-password").await;
    assert_eq!(resp.status(), 200);
    let page = body_text(resp).await;
    assert!(page.contains("INVALID_LOGIN_CREDENTIALS"));
    assert!(page.contains(&format!(r#"value="{TEST_EMAIL}""#)));
    assert_eq!(env.provider.call_count(), 1);

    assert_eq!(current_session(&app, &cookie).await["signed_in"], false);
}

/// Blank fields are refused before the provider is contacted.
#[actix_rt::test]
async fn test_blank_sign_in_stays_local() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let resp = post_login(&app, &cookie, "", "").await;
    assert_eq!(resp.status(), 200);
    let page = body_text(resp).await;
    assert!(page.contains("Please enter your email and password"));
    assert_eq!(env.provider.call_count(), 0);
}

/// Signing out clears the identity for every later request.
#[actix_rt::test]
async fn test_sign_out_clears_session() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = signed_in_session(&app).await;

    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp).as_deref(), Some("/"));

    assert_eq!(current_session(&app, &cookie).await["signed_in"], false);

    let resp = post_upload_form(&app, Some(&cookie), "single", &[TestFile::png("storm.png", 1024)]).await;
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}

/// 1. Create an account with a display name
/// 2. Signed in right away, the name is attached to the identity
#[actix_rt::test]
async fn test_sign_up_attaches_display_name() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let req = test::TestRequest::post()
        .uri("/signup")
        .cookie(cookie.clone())
        .set_form([
            ("name", "  Bea Cruz  "),
            ("email", "bea@example.com"),
            ("password", "typhoon1"),
            ("confirm_password", "typhoon1"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp).as_deref(), Some("/"));

    let session = current_session(&app, &cookie).await;
    assert_eq!(session["signed_in"], true);
    assert_eq!(session["user"]["email"], "bea@example.com");
    assert_eq!(session["user"]["display_name"], "Bea Cruz");

    // Account creation plus the profile update.
    assert_eq!(env.provider.call_count(), 2);
}

/// Sign-up checks run in order and never reach the provider.
#[actix_rt::test]
async fn test_sign_up_mismatch_reported_first() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let req = test::TestRequest::post()
        .uri("/signup")
        .cookie(cookie.clone())
        .set_form([
            ("name", "Bea"),
            ("email", ""),
            ("password", "abc"),
            ("confirm_password", "abd"),
        ])
        .to_request();
    let page = body_text(test::call_service(&app, req).await).await;

    assert!(page.contains("Passwords do not match"));
    assert!(!page.contains("Password must be at least 6 characters"));
    assert_eq!(env.provider.call_count(), 0);
}

/// An existing email is refused with the provider's message.
#[actix_rt::test]
async fn test_sign_up_existing_email() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let req = test::TestRequest::post()
        .uri("/signup")
        .cookie(cookie.clone())
        .set_form([
            ("name", ""),
            ("email", TEST_EMAIL),
            ("password", "another1"),
            ("confirm_password", "another1"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert!(body_text(resp).await.contains("EMAIL_EXISTS"));
    assert_eq!(current_session(&app, &cookie).await["signed_in"], false);
}

/// A tampered session cookie is replaced with a fresh anonymous session.
#[actix_rt::test]
async fn test_tampered_cookie_starts_new_session() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = signed_in_session(&app).await;

    let mut forged = cookie.clone();
    forged.set_value(format!("{}x", cookie.value()));

    let req = test::TestRequest::get()
        .uri("/api/v1/session")
        .cookie(forged)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let replacement = response_cookie(&resp, SESSION_COOKIE).expect("new session cookie");
    assert_ne!(replacement.value(), cookie.value());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["signed_in"], false);
}
