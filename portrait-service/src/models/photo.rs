use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded source image. Written once on upload and never modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    #[serde(rename = "_id")]
    pub id: String,
    pub filename: Option<String>,
    pub content_type: String,
    /// Base64 of the uploaded bytes.
    pub image_data: String,
    pub has_face: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub uploaded_at: DateTime<Utc>,
}

impl Photo {
    pub fn new(
        filename: Option<String>,
        content_type: String,
        bytes: &[u8],
        has_face: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename,
            content_type,
            image_data: STANDARD.encode(bytes),
            has_face,
            uploaded_at: super::store_now(),
        }
    }

    pub fn decode_image(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.image_data)
    }
}
