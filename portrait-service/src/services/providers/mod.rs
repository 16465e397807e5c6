//! Image generation provider abstraction.
//!
//! A provider turns a source image plus a prompt into generated images and
//! optional descriptive text. Every call carries its own
//! [`GenerationSession`]; sessions are minted per request and never reused.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Output kinds a generation request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputModality {
    Image,
    Text,
}

impl OutputModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputModality::Image => "IMAGE",
            OutputModality::Text => "TEXT",
        }
    }
}

/// Per-request generation context.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    pub session_id: String,
    pub api_key: String,
    pub model: String,
    pub system_message: String,
}

impl GenerationSession {
    pub const SYSTEM_MESSAGE: &'static str =
        "You are an expert at creating whimsical, child-friendly illustrated characters.";

    pub fn new(api_key: String, model: String) -> Self {
        Self {
            session_id: format!("personalize-{}", Uuid::new_v4()),
            api_key,
            model,
            system_message: Self::SYSTEM_MESSAGE.to_string(),
        }
    }
}

/// Source image and instructions for one generation call.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// Base64 of the source image, as stored.
    pub source_image: String,
    pub source_mime_type: String,
    pub modalities: Vec<OutputModality>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64 of the generated image.
    pub data: String,
}

/// Result of a generation call. `images` may be empty.
#[derive(Debug, Clone, Default)]
pub struct ImageResponse {
    pub text: Option<String>,
    pub images: Vec<GeneratedImage>,
}

/// Trait for image-to-image generation providers (e.g., Gemini).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(
        &self,
        session: &GenerationSession,
        request: &ImageRequest,
    ) -> Result<ImageResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_session_gets_a_fresh_id() {
        let a = GenerationSession::new("k".into(), "m".into());
        let b = GenerationSession::new("k".into(), "m".into());

        assert!(a.session_id.starts_with("personalize-"));
        assert_ne!(a.session_id, b.session_id);
    }
}
