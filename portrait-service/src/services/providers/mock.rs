//! Mock provider implementation for local runs and tests.

use super::{
    GeneratedImage, GenerationSession, ImageProvider, ImageRequest, ImageResponse, ProviderError,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Echo the source image back as the generated image.
    EchoSource,
    /// Return a text answer and no image.
    NoImage,
    /// Fail as the upstream API would.
    Fail(String),
}

/// Mock image provider. Records the sessions it was called with.
pub struct MockImageProvider {
    behavior: MockBehavior,
    sessions: Mutex<Vec<String>>,
}

impl MockImageProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Session ids seen so far, in call order.
    pub fn seen_sessions(&self) -> Vec<String> {
        self.sessions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Default for MockImageProvider {
    fn default() -> Self {
        Self::new(MockBehavior::EchoSource)
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(
        &self,
        session: &GenerationSession,
        request: &ImageRequest,
    ) -> Result<ImageResponse, ProviderError> {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.push(session.session_id.clone());
        }

        match &self.behavior {
            MockBehavior::EchoSource => Ok(ImageResponse {
                text: Some(format!("Mock illustration for: {}", request.prompt)),
                images: vec![GeneratedImage {
                    mime_type: request.source_mime_type.clone(),
                    data: request.source_image.clone(),
                }],
            }),
            MockBehavior::NoImage => Ok(ImageResponse {
                text: Some("Mock provider produced no image".to_string()),
                images: Vec::new(),
            }),
            MockBehavior::Fail(message) => Err(ProviderError::ApiError(message.clone())),
        }
    }
}
