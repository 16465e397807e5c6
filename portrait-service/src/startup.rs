//! Application startup and lifecycle management.

use crate::config::{CorsConfig, PortraitConfig, ProviderBackend};
use crate::handlers;
use crate::services::providers::gemini::GeminiImageProvider;
use crate::services::providers::mock::MockImageProvider;
use crate::services::providers::ImageProvider;
use crate::services::{FaceDetector, MongoDb, PortraitStore, SeetaFaceDetector};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    http_request_span, metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Headroom for multipart boundaries and part headers on top of the file cap.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state. Collaborators are injected so tests can swap
/// in fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: PortraitConfig,
    pub store: Arc<dyn PortraitStore>,
    pub face_detector: Arc<dyn FaceDetector>,
    pub provider: Arc<dyn ImageProvider>,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_bytes + MULTIPART_OVERHEAD_BYTES;
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .route("/api/upload", post(handlers::upload_photo))
        .route("/api/generate", post(handlers::generate_personalized_image))
        .route("/api/gallery", get(handlers::list_gallery))
        .route(
            "/api/personalized/:image_id",
            get(handlers::get_personalized_image),
        )
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(http_request_span::<axum::body::Body>),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}

/// Credentials are allowed, so a permissive policy mirrors the caller's
/// origin instead of answering `*`.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(config.allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn build_provider(config: &PortraitConfig) -> Result<Arc<dyn ImageProvider>, AppError> {
    match config.generation.backend {
        ProviderBackend::Gemini => {
            let provider = GeminiImageProvider::new()
                .map_err(|e| AppError::Misconfigured(anyhow::anyhow!("{}", e)))?;
            tracing::info!(model = %config.generation.model, "Initialized Gemini image provider");
            Ok(Arc::new(provider))
        }
        ProviderBackend::Mock => {
            tracing::warn!("Using mock image provider");
            Ok(Arc::new(MockImageProvider::default()))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    db: MongoDb,
    state: AppState,
}

impl Application {
    pub async fn build(config: PortraitConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let provider = build_provider(&config)?;
        let face_detector: Arc<dyn FaceDetector> = Arc::new(SeetaFaceDetector::new(
            config.face_detection.model_path.clone(),
        ));

        if config.generation.api_key.is_none() {
            tracing::warn!("GOOGLE_API_KEY not set, generation requests will fail");
        }

        let state = AppState {
            config: config.clone(),
            store: Arc::new(db.clone()),
            face_detector,
            provider,
        };

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::Misconfigured(anyhow::anyhow!("Failed to bind {}: {}", addr, e))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| AppError::Misconfigured(anyhow::Error::new(e)))?
            .port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            db,
            state,
        })
    }

    pub fn db(&self) -> &MongoDb {
        &self.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves until `shutdown` resolves, then closes the store client.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.state);

        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        self.db.shutdown().await;
        result
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }
}
