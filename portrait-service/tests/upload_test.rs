mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{
    multipart_request, multipart_request_with_fields, png_bytes, test_config, ScriptedDetector,
    TestApp,
};
use portrait_service::services::providers::mock::MockBehavior;

#[tokio::test]
async fn upload_valid_png_returns_id_timestamp_and_face_flag() {
    let app = TestApp::with(
        test_config(),
        MockBehavior::EchoSource,
        ScriptedDetector::Found(false),
    );

    let (status, body) = app.upload(&png_bytes(), Some("image/png")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert!(chrono::DateTime::parse_from_rfc3339(body["uploaded_at"].as_str().unwrap()).is_ok());
    assert_eq!(body["has_face"], false);
    assert_eq!(body["message"], "Photo uploaded successfully");
    assert_eq!(app.store.photo_count(), 1);
}

#[tokio::test]
async fn upload_rejects_non_image_content_type_regardless_of_bytes() {
    let app = TestApp::new();

    let (status, body) = app.upload(&png_bytes(), Some("text/plain")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "File must be an image");
    assert_eq!(app.store.photo_count(), 0);
}

#[tokio::test]
async fn upload_without_declared_content_type_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.upload(&png_bytes(), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "File must be an image");
}

#[tokio::test]
async fn declared_image_type_is_accepted_even_for_non_image_bytes() {
    let app = TestApp::new();

    let (status, body) = app.upload(b"plain text pretending", Some("image/jpeg")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_face"], true);
}

#[tokio::test]
async fn detector_failure_does_not_block_upload() {
    let app = TestApp::with(test_config(), MockBehavior::EchoSource, ScriptedDetector::Fails);

    let (status, body) = app.upload(&png_bytes(), Some("image/png")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_face"], true);
}

#[tokio::test]
async fn stored_payload_decodes_to_submitted_bytes() {
    let app = TestApp::new();
    let original = png_bytes();

    let (status, body) = app.upload(&original, Some("image/png")).await;
    assert_eq!(status, StatusCode::OK);

    let photos = app.store.photos.lock().unwrap();
    let stored = photos
        .iter()
        .find(|p| p.id == body["id"].as_str().unwrap())
        .expect("photo not stored");

    assert_eq!(STANDARD.decode(&stored.image_data).unwrap(), original);
    assert_eq!(stored.filename.as_deref(), Some("kid.png"));
    assert_eq!(stored.content_type, "image/png");
}

#[tokio::test]
async fn persistence_failure_surfaces_as_server_error() {
    let app = TestApp::new();
    app.store.set_failing(true);

    let (status, body) = app.upload(&png_bytes(), Some("image/png")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "store unavailable");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let mut config = test_config();
    config.upload.max_bytes = 64;
    let app = TestApp::with(config, MockBehavior::EchoSource, ScriptedDetector::Found(true));

    let (status, body) = app
        .send(multipart_request("/api/upload", "big.png", &[7u8; 128], Some("image/png")))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("too large"));
    assert_eq!(app.store.photo_count(), 0);
}

#[tokio::test]
async fn non_multipart_request_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Request::post("/api/upload")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn text_fields_before_the_file_are_skipped() {
    let app = TestApp::new();
    let png = png_bytes();

    let (status, body) = app
        .send(multipart_request_with_fields(
            "/api/upload",
            &[("note", "hello")],
            Some(("kid.png", png.as_slice(), Some("image/png"))),
        ))
        .await;

    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(app.store.photo_count(), 1);

    let photos = app.store.photos.lock().unwrap();
    assert_eq!(STANDARD.decode(&photos[0].image_data).unwrap(), png);
}

#[tokio::test]
async fn form_without_file_part_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .send(multipart_request_with_fields(
            "/api/upload",
            &[("note", "hello")],
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No file uploaded");
    assert_eq!(app.store.photo_count(), 0);
}
