use crate::models::PersonalizedImage;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROMPT: &str = "Transform this child into a whimsical illustrated character with big expressive eyes, soft features, wearing a floral dress with a pink flower headband, in a cute cartoon style with pastel colors and a warm, playful atmosphere";

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub photo_id: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl GenerateRequest {
    /// The caller's prompt, or the default illustration prompt when omitted.
    pub fn resolved_prompt(&self) -> String {
        self.prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string())
    }
}

/// Public view of a generated image. The provider's free-text response stays
/// in the store.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersonalizedImageResponse {
    pub id: String,
    pub original_photo_id: String,
    pub personalized_image: String,
    pub mime_type: String,
    pub template_used: String,
    pub created_at: String,
    pub prompt_used: String,
}

impl From<PersonalizedImage> for PersonalizedImageResponse {
    fn from(image: PersonalizedImage) -> Self {
        Self {
            created_at: super::format_timestamp(&image.created_at),
            id: image.id,
            original_photo_id: image.original_photo_id,
            personalized_image: image.personalized_image,
            mime_type: image.mime_type,
            template_used: image.template_used,
            prompt_used: image.prompt_used,
        }
    }
}
