use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label stored with every generated image; identifies the generation recipe.
pub const TEMPLATE_LABEL: &str = "gemini-nano-banana";

/// A provider-generated image derived from a stored photo.
///
/// `original_photo_id` pointed at an existing photo when the record was
/// written; nothing re-checks it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizedImage {
    #[serde(rename = "_id")]
    pub id: String,
    pub original_photo_id: String,
    /// Base64 of the generated image.
    pub personalized_image: String,
    pub mime_type: String,
    pub template_used: String,
    pub prompt_used: String,
    #[serde(default)]
    pub text_response: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl PersonalizedImage {
    pub fn new(
        original_photo_id: String,
        personalized_image: String,
        mime_type: String,
        prompt_used: String,
        text_response: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            original_photo_id,
            personalized_image,
            mime_type,
            template_used: TEMPLATE_LABEL.to_string(),
            prompt_used,
            text_response,
            created_at: super::store_now(),
        }
    }
}
