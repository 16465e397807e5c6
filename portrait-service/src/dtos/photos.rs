use crate::models::Photo;
use serde::{Deserialize, Serialize};

pub const UPLOAD_MESSAGE: &str = "Photo uploaded successfully";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: String,
    pub uploaded_at: String,
    pub has_face: bool,
    pub message: String,
}

impl From<&Photo> for UploadResponse {
    fn from(photo: &Photo) -> Self {
        Self {
            id: photo.id.clone(),
            uploaded_at: super::format_timestamp(&photo.uploaded_at),
            has_face: photo.has_face,
            message: UPLOAD_MESSAGE.to_string(),
        }
    }
}
