use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct PortraitConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub cors: CorsConfig,
    pub generation: GenerationConfig,
    pub face_detection: FaceDetectionConfig,
    pub upload: UploadConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Empty means any origin is allowed.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub backend: ProviderBackend,
    /// Checked on every generate call rather than at startup, so a service
    /// without a key still uploads and serves the gallery.
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    Gemini,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceDetectionConfig {
    pub model_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl PortraitConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(PortraitConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("portrait_db"), is_prod)?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env("CORS_ORIGINS", Some("*"), is_prod)?),
            },
            generation: GenerationConfig {
                backend: get_env("GENERATION_PROVIDER", Some("gemini"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::Misconfigured(anyhow::anyhow!(e)))?,
                api_key: optional_env("GOOGLE_API_KEY"),
                model: get_env(
                    "GENAI_IMAGE_MODEL",
                    Some("gemini-2.5-flash-image-preview"),
                    is_prod,
                )?,
            },
            face_detection: FaceDetectionConfig {
                model_path: optional_env("FACE_MODEL_PATH"),
            },
            upload: UploadConfig {
                max_bytes: get_env(
                    "UPLOAD_MAX_BYTES",
                    Some(&DEFAULT_UPLOAD_MAX_BYTES.to_string()),
                    is_prod,
                )?
                .parse()
                .map_err(|e| {
                    AppError::Misconfigured(anyhow::anyhow!("Invalid UPLOAD_MAX_BYTES: {}", e))
                })?,
            },
            otlp_endpoint: optional_env("OTLP_ENDPOINT"),
        })
    }
}

impl std::str::FromStr for ProviderBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderBackend::Gemini),
            "mock" => Ok(ProviderBackend::Mock),
            _ => Err(format!("Invalid generation provider: {}", s)),
        }
    }
}

/// Splits a comma-separated origin list. A `*` anywhere in the list means
/// "allow any origin" and yields an empty list.
pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::Misconfigured(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::Misconfigured(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
