#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use portrait_service::config::{
    CorsConfig, FaceDetectionConfig, GenerationConfig, MongoConfig, PortraitConfig,
    ProviderBackend, UploadConfig,
};
use portrait_service::models::{PersonalizedImage, Photo};
use portrait_service::services::providers::mock::{MockBehavior, MockImageProvider};
use portrait_service::services::providers::ImageProvider;
use portrait_service::services::{DetectorError, FaceDetector, PortraitStore};
use portrait_service::startup::{build_router, AppState};
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const TEST_API_KEY: &str = "test-api-key";
pub const MULTIPART_BOUNDARY: &str = "portrait-test-boundary";

/// In-memory stand-in for MongoDB.
#[derive(Default)]
pub struct InMemoryStore {
    pub photos: Mutex<Vec<Photo>>,
    pub personalized: Mutex<Vec<PersonalizedImage>>,
    failing: AtomicBool,
    failing_photo_lookups: AtomicBool,
    failing_personalized_inserts: AtomicBool,
}

impl InMemoryStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fails only `find_photo`.
    pub fn fail_photo_lookups(&self, failing: bool) {
        self.failing_photo_lookups.store(failing, Ordering::SeqCst);
    }

    /// Fails only `insert_personalized`.
    pub fn fail_personalized_inserts(&self, failing: bool) {
        self.failing_personalized_inserts
            .store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        Self::check_flag(&self.failing)
    }

    fn check_flag(flag: &AtomicBool) -> Result<(), AppError> {
        if flag.load(Ordering::SeqCst) {
            Err(AppError::Persistence(anyhow::anyhow!("store unavailable")))
        } else {
            Ok(())
        }
    }

    pub fn photo_count(&self) -> usize {
        self.photos.lock().unwrap().len()
    }

    pub fn personalized_count(&self) -> usize {
        self.personalized.lock().unwrap().len()
    }
}

#[async_trait]
impl PortraitStore for InMemoryStore {
    async fn insert_photo(&self, photo: &Photo) -> Result<(), AppError> {
        self.check()?;
        self.photos.lock().unwrap().push(photo.clone());
        Ok(())
    }

    async fn find_photo(&self, id: &str) -> Result<Option<Photo>, AppError> {
        self.check()?;
        Self::check_flag(&self.failing_photo_lookups)?;
        Ok(self.photos.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn insert_personalized(&self, image: &PersonalizedImage) -> Result<(), AppError> {
        self.check()?;
        Self::check_flag(&self.failing_personalized_inserts)?;
        self.personalized.lock().unwrap().push(image.clone());
        Ok(())
    }

    async fn find_personalized(&self, id: &str) -> Result<Option<PersonalizedImage>, AppError> {
        self.check()?;
        Ok(self
            .personalized
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn recent_personalized(&self, limit: i64) -> Result<Vec<PersonalizedImage>, AppError> {
        self.check()?;
        let mut images = self.personalized.lock().unwrap().clone();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        images.truncate(limit as usize);
        Ok(images)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }
}

/// Detector that answers with a fixed outcome.
pub enum ScriptedDetector {
    Found(bool),
    Fails,
}

impl FaceDetector for ScriptedDetector {
    fn detect(&self, _image: &[u8]) -> Result<bool, DetectorError> {
        match self {
            ScriptedDetector::Found(found) => Ok(*found),
            ScriptedDetector::Fails => Err(DetectorError::Decode("scripted failure".to_string())),
        }
    }
}

pub fn test_config() -> PortraitConfig {
    PortraitConfig {
        common: CoreConfig {
            port: 0,
            log_level: "debug".to_string(),
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "portrait_test".to_string(),
        },
        cors: CorsConfig {
            allowed_origins: Vec::new(),
        },
        generation: GenerationConfig {
            backend: ProviderBackend::Mock,
            api_key: Some(TEST_API_KEY.to_string()),
            model: "gemini-test-image".to_string(),
        },
        face_detection: FaceDetectionConfig { model_path: None },
        upload: UploadConfig {
            max_bytes: 1024 * 1024,
        },
        otlp_endpoint: None,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub provider: Arc<MockImageProvider>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(
            test_config(),
            MockBehavior::EchoSource,
            ScriptedDetector::Found(true),
        )
    }

    pub fn with(
        config: PortraitConfig,
        behavior: MockBehavior,
        detector: ScriptedDetector,
    ) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let provider = Arc::new(MockImageProvider::new(behavior));

        let state = AppState {
            config,
            store: store.clone(),
            face_detector: Arc::new(detector),
            provider: provider.clone() as Arc<dyn ImageProvider>,
        };

        Self {
            state,
            store,
            provider,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn upload(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        self.send(multipart_request("/api/upload", "kid.png", bytes, content_type))
            .await
    }

    pub async fn generate(
        &self,
        photo_id: &str,
        prompt: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let payload = match prompt {
            Some(p) => serde_json::json!({ "photo_id": photo_id, "prompt": p }),
            None => serde_json::json!({ "photo_id": photo_id }),
        };

        self.send(
            Request::post("/api/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Uploads a small PNG and returns its photo id.
    pub async fn uploaded_photo(&self) -> String {
        let (status, body) = self.upload(&png_bytes(), Some("image/png")).await;
        assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
        body["id"].as_str().expect("id missing").to_string()
    }
}

pub fn multipart_request(
    uri: &str,
    filename: &str,
    bytes: &[u8],
    content_type: Option<&str>,
) -> Request<Body> {
    multipart_request_with_fields(uri, &[], Some((filename, bytes, content_type)))
}

/// Builds a form with plain text fields first, then an optional `file` part.
pub fn multipart_request_with_fields(
    uri: &str,
    text_fields: &[(&str, &str)],
    file: Option<(&str, &[u8], Option<&str>)>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((filename, bytes, content_type)) = file {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// A real 16x16 PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([173, 216, 230]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf
}
