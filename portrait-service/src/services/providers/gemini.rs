//! Gemini image provider implementation.
//!
//! Sends the source photo inline with the prompt to `generateContent` and
//! asks for image and text output modalities.

use super::{
    GeneratedImage, GenerationSession, ImageProvider, ImageRequest, ImageResponse, ProviderError,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini image provider.
pub struct GeminiImageProvider {
    base_url: String,
    client: Client,
}

impl GeminiImageProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(GEMINI_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    fn build_request(session: &GenerationSession, request: &ImageRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![ContentPart::Text {
                    text: session.system_message.clone(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    ContentPart::Text {
                        text: request.prompt.clone(),
                    },
                    ContentPart::InlineData {
                        inline_data: InlineData {
                            mime_type: request.source_mime_type.clone(),
                            data: request.source_image.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: request
                    .modalities
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            },
        }
    }
}

#[async_trait]
impl ImageProvider for GeminiImageProvider {
    async fn generate(
        &self,
        session: &GenerationSession,
        request: &ImageRequest,
    ) -> Result<ImageResponse, ProviderError> {
        if session.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let body = Self::build_request(session, request);
        let url = self.api_url(&session.model, "generateContent");

        tracing::debug!(
            session_id = %session.session_id,
            model = %session.model,
            prompt_len = request.prompt.len(),
            "Sending image generation request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &session.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        if api_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .is_some()
        {
            return Err(ProviderError::ContentFiltered);
        }

        let candidate = api_response.candidates.into_iter().next();

        if let Some(reason) = candidate.as_ref().and_then(|c| c.finish_reason.as_deref()) {
            if matches!(reason, "SAFETY" | "PROHIBITED_CONTENT" | "IMAGE_SAFETY") {
                return Err(ProviderError::ContentFiltered);
            }
        }

        let parts = candidate
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let response = collect_parts(parts);

        tracing::debug!(
            session_id = %session.session_id,
            images = response.images.len(),
            has_text = response.text.is_some(),
            "Gemini API response received"
        );

        Ok(response)
    }
}

/// Splits response parts into concatenated text and inline images.
fn collect_parts(parts: Vec<ContentPart>) -> ImageResponse {
    let mut texts = Vec::new();
    let mut images = Vec::new();

    for part in parts {
        match part {
            ContentPart::Text { text } => texts.push(text),
            ContentPart::InlineData { inline_data } => images.push(GeneratedImage {
                mime_type: inline_data.mime_type,
                data: inline_data.data,
            }),
            ContentPart::Other(_) => {}
        }
    }

    ImageResponse {
        text: if texts.is_empty() {
            None
        } else {
            Some(texts.join(""))
        },
        images,
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
