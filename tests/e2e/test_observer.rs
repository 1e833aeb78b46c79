//! E2E tests: session observers see every identity change of their browser.

use std::time::Duration;

use actix_web::test;

use super::test_helpers::*;

const WAIT: Duration = Duration::from_secs(2);

/// 1. Observe an anonymous browser
/// 2. Sign in: observer sees the identity
/// 3. Sign out: observer sees none
#[actix_rt::test]
async fn test_observer_follows_sign_in_and_out() {
    let env = TestEnv::new();
    let uid = env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let mut observer = env.context.registry.observe(&env.session_id(&cookie));
    assert!(observer.current().is_none());

    let resp = post_login(&app, &cookie, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(resp.status(), 303);

    let seen = tokio::time::timeout(WAIT, observer.changed())
        .await
        .expect("sign-in should notify")
        .expect("session still registered");
    assert_eq!(seen.map(|identity| identity.uid), Some(uid));

    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(cookie.clone())
        .to_request();
    test::call_service(&app, req).await;

    let seen = tokio::time::timeout(WAIT, observer.changed())
        .await
        .expect("sign-out should notify")
        .expect("session still registered");
    assert!(seen.is_none());
}

/// Observers of another browser are not notified.
#[actix_rt::test]
async fn test_observers_are_per_browser() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;

    let other = start_session(&app).await;
    let mut other_observer = env.context.registry.observe(&env.session_id(&other));

    signed_in_session(&app).await;

    let waited = tokio::time::timeout(Duration::from_millis(100), other_observer.changed()).await;
    assert!(waited.is_err(), "unrelated browser must not be notified");
    assert!(other_observer.current().is_none());
}

/// 1. Sign in with tokens that are already expired
/// 2. Upload refreshes them once and succeeds
/// 3. Refresh tokens revoked: next upload signs the browser out
#[actix_rt::test]
async fn test_refused_refresh_signs_out() {
    let env = TestEnv::with_expired_tokens();
    let uid = env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = signed_in_session(&app).await;

    let (status, _) = post_upload_json(&app, Some(&cookie), "single", &[TestFile::png("one.png", 1024)]).await;
    assert_eq!(status, 201);
    assert_eq!(env.store.records(&uid).len(), 1);

    let mut observer = env.context.registry.observe(&env.session_id(&cookie));
    assert!(observer.current().is_some());

    env.provider.revoke_refresh_tokens(&uid);

    let resp = post_upload_form(&app, Some(&cookie), "single", &[TestFile::png("two.png", 1024)]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp).as_deref(), Some("/login"));

    let seen = tokio::time::timeout(WAIT, observer.changed())
        .await
        .expect("sign-out should notify")
        .expect("session still registered");
    assert!(seen.is_none());
    assert_eq!(current_session(&app, &cookie).await["signed_in"], false);
    assert_eq!(env.store.records(&uid).len(), 1);
}
