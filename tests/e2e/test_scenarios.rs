//! E2E tests: upload scenarios through the tools page and the JSON API.

use std::time::Duration;

use tcc_predictor_lib::services::upload::validator::MAX_FILE_SIZE;

use super::test_helpers::*;

const MIB: usize = 1024 * 1024;

/// (A) Signed in, one 2 MiB PNG in single mode → one record, progress 100,
/// batch cleared after the display window.
#[actix_rt::test]
async fn test_single_png_is_stored_and_cleared() {
    let env = TestEnv::new();
    let uid = env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = signed_in_session(&app).await;

    let resp = post_upload_form(&app, Some(&cookie), "single", &[TestFile::png("storm.png", 2 * MIB)]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp).as_deref(), Some("/tools?mode=single"));

    let records = env.store.records(&uid);
    assert_eq!(records.len(), 1);
    let (_, record) = &records[0];
    let json = serde_json::to_value(record).unwrap();
    assert_eq!(json["analysisType"], "single");
    assert_eq!(json["status"], "uploaded");
    assert_eq!(json["userId"], uid.as_str());
    assert_eq!(json["fileName"], "storm.png");
    assert_eq!(json["fileSize"], (2 * MIB) as u64);
    assert!(record.image_data.starts_with("data:image/png;base64,"));

    let state = upload_state(&app, &cookie).await;
    assert_eq!(state["phase"], "succeeded");
    assert_eq!(state["progress"], 100.0);
    assert_eq!(state["batch"], serde_json::json!(["storm.png"]));

    tokio::time::sleep(Duration::from_millis(DISPLAY_WINDOW_MS * 3)).await;

    let state = upload_state(&app, &cookie).await;
    assert_eq!(state["phase"], "idle");
    assert_eq!(state["progress"], 0.0);
    assert_eq!(state["batch"], serde_json::json!([]));
}

/// (B) Signed in, five JPEGs in multi mode → five records tagged multi.
#[actix_rt::test]
async fn test_multi_batch_writes_every_file() {
    let env = TestEnv::new();
    let uid = env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = signed_in_session(&app).await;

    let files: Vec<TestFile> = (1..=5)
        .map(|i| TestFile::jpeg(&format!("frame-{i}.jpg"), 64 * 1024))
        .collect();
    let (status, body) = post_upload_json(&app, Some(&cookie), "multi", &files).await;

    assert_eq!(status, 201, "upload should succeed: {body}");
    assert_eq!(body["mode"], "multi");
    assert_eq!(body["progress"], 100.0);
    assert_eq!(body["files"].as_array().unwrap().len(), 5);

    let records = env.store.records(&uid);
    assert_eq!(records.len(), 5);
    for (key, record) in &records {
        assert!(key.0.starts_with("-mem"));
        assert_eq!(serde_json::to_value(record).unwrap()["analysisType"], "multi");
        assert!(record.image_data.starts_with("data:image/jpeg;base64,"));
    }
}

/// (C) Signed in, two images in multi mode → range rejection, nothing written.
#[actix_rt::test]
async fn test_multi_batch_below_range_is_rejected() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = signed_in_session(&app).await;

    let files = [TestFile::png("a.png", 1024), TestFile::png("b.png", 1024)];
    let (status, body) = post_upload_json(&app, Some(&cookie), "multi", &files).await;

    assert_eq!(status, 422);
    assert_eq!(body["error"], "MULTI_IMAGE_RANGE");
    assert_eq!(body["message"], "Please upload 3-10 images for multi-image tracking");
    assert_eq!(env.store.append_count(), 0);

    // Rejection leaves batch and progress untouched and shows the error.
    let state = upload_state(&app, &cookie).await;
    assert_eq!(state["batch"], serde_json::json!([]));
    assert_eq!(state["progress"], 0.0);
    assert_eq!(state["error"], "Please upload 3-10 images for multi-image tracking");

    // Same files, same reason.
    let resp = post_upload_form(&app, Some(&cookie), "multi", &files).await;
    assert_eq!(resp.status(), 303);
    let state = upload_state(&app, &cookie).await;
    assert_eq!(state["error"], "Please upload 3-10 images for multi-image tracking");
    assert_eq!(env.store.append_count(), 0);
}

/// (D) Not signed in → redirected to sign-in, no provider or store calls.
#[actix_rt::test]
async fn test_anonymous_upload_redirects_to_login() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let resp = post_upload_form(&app, Some(&cookie), "single", &[TestFile::png("storm.png", 1024)]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp).as_deref(), Some("/login"));

    // No cookie at all behaves the same.
    let resp = post_upload_form(&app, None, "single", &[TestFile::png("storm.png", 1024)]).await;
    assert_eq!(location(&resp).as_deref(), Some("/login"));

    let (status, body) = post_upload_json(&app, Some(&cookie), "single", &[TestFile::png("storm.png", 1024)]).await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Unauthorized: Please sign in to upload images");

    assert_eq!(env.provider.call_count(), 0);
    assert_eq!(env.store.append_count(), 0);
}

/// (E) Sign-up with a three-character password → local rejection, no account call.
#[actix_rt::test]
async fn test_short_sign_up_password_never_reaches_provider() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    let cookie = start_session(&app).await;

    let req = actix_web::test::TestRequest::post()
        .uri("/signup")
        .cookie(cookie.clone())
        .set_form([
            ("name", "Ana"),
            ("email", "new@example.com"),
            ("password", "abc"),
            ("confirm_password", "abc"),
        ])
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let page = body_text(resp).await;
    assert!(page.contains("Password must be at least 6 characters"));
    assert!(page.contains(r#"value="new@example.com""#));
    assert_eq!(env.provider.call_count(), 0);
}

/// Any file over 10 MiB aborts the accepted batch before a single write.
#[actix_rt::test]
async fn test_oversized_file_aborts_whole_batch() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = signed_in_session(&app).await;

    let files = [
        TestFile::png("ok-1.png", 1024),
        TestFile::png("huge.png", MAX_FILE_SIZE as usize + 1),
        TestFile::png("ok-2.png", 1024),
    ];
    let (status, body) = post_upload_json(&app, Some(&cookie), "multi", &files).await;

    assert_eq!(status, 413);
    assert_eq!(
        body["message"],
        "File(s) too large. Maximum size is 10MB per file. Please compress your images."
    );
    assert_eq!(env.store.append_count(), 0);

    let state = upload_state(&app, &cookie).await;
    assert_eq!(state["phase"], "failed");
    assert_eq!(state["batch"], serde_json::json!([]));
}

/// Files of other types are dropped before the count check.
#[actix_rt::test]
async fn test_unsupported_types_are_filtered() {
    let env = TestEnv::new();
    let uid = env.add_test_account();
    let app = create_test_app(&env).await;
    let cookie = signed_in_session(&app).await;

    let (status, body) = post_upload_json(
        &app,
        Some(&cookie),
        "single",
        &[TestFile::new("notes.pdf", "application/pdf", 2048)],
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["message"], "Please upload PNG, JPG, or TIFF images only");

    let (status, _) = post_upload_json(
        &app,
        Some(&cookie),
        "single",
        &[
            TestFile::new("notes.pdf", "application/pdf", 2048),
            TestFile::new("scan.tif", "image/tiff", 2048),
        ],
    )
    .await;
    assert_eq!(status, 201);
    let records = env.store.records(&uid);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].1.file_name, "scan.tif");
}

/// Tools page reflects the session and the chosen tab.
#[actix_rt::test]
async fn test_tools_page_follows_mode_and_identity() {
    let env = TestEnv::new();
    env.add_test_account();
    let app = create_test_app(&env).await;

    let anonymous = start_session(&app).await;
    let req = actix_web::test::TestRequest::get()
        .uri("/tools?mode=multi")
        .cookie(anonymous.clone())
        .to_request();
    let page = body_text(actix_web::test::call_service(&app, req).await).await;
    assert!(page.contains("Sign in required"));
    assert!(page.contains("Upload Image Sequence"));

    let cookie = signed_in_session(&app).await;
    let req = actix_web::test::TestRequest::get()
        .uri("/tools?mode=single")
        .cookie(cookie.clone())
        .to_request();
    let page = body_text(actix_web::test::call_service(&app, req).await).await;
    assert!(!page.contains("Sign in required"));
    assert!(page.contains(r#"action="/tools/upload""#));
    assert!(page.contains("Sign Out"));

    // Tab choice persists for the session.
    let state = upload_state(&app, &cookie).await;
    assert_eq!(state["mode"], "single");
}
