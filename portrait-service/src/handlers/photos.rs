use crate::dtos::UploadResponse;
use crate::models::Photo;
use crate::services::metrics::PHOTOS_UPLOADED;
use crate::services::{has_face_or_assume, DetectorError};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use metrics::counter;
use service_core::error::AppError;

pub async fn upload_photo(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(anyhow::anyhow!("{}", e)))?;
    let FilePart {
        filename,
        content_type,
        data,
    } = read_file_part(&mut multipart).await?;

    let max_bytes = state.config.upload.max_bytes;
    if data.len() > max_bytes {
        return Err(AppError::Validation(anyhow::anyhow!(
            "File too large (max {} bytes)",
            max_bytes
        )));
    }

    tracing::info!(
        filename = ?filename,
        content_type = %content_type,
        size = data.len(),
        "Photo upload started"
    );

    let has_face = detect_face(&state, data.clone()).await;
    let photo = Photo::new(filename, content_type, &data, has_face);

    state.store.insert_photo(&photo).await?;
    counter!(PHOTOS_UPLOADED).increment(1);

    tracing::info!(
        photo_id = %photo.id,
        has_face = photo.has_face,
        "Photo upload completed successfully"
    );

    Ok(Json(UploadResponse::from(&photo)))
}

struct FilePart {
    filename: Option<String>,
    content_type: String,
    data: Bytes,
}

/// Reads the first field that carries a file, skipping plain form fields.
async fn read_file_part(multipart: &mut Multipart) -> Result<FilePart, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        if field.file_name().is_none() && field.name() != Some("file") {
            tracing::debug!(field = ?field.name(), "Skipping non-file multipart field");
            continue;
        }

        // Only the declared type is checked; the bytes are not sniffed.
        let content_type = field
            .content_type()
            .filter(|ct| ct.starts_with("image/"))
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation(anyhow::anyhow!("File must be an image")))?;
        let filename = field.file_name().map(str::to_string);

        let data = field.bytes().await.map_err(|e| {
            AppError::Validation(anyhow::anyhow!("Failed to read file bytes: {}", e))
        })?;

        return Ok(FilePart {
            filename,
            content_type,
            data,
        });
    }

    Err(AppError::Validation(anyhow::anyhow!("No file uploaded")))
}

/// Runs the detector on the blocking pool. Never fails: see
/// [`has_face_or_assume`].
async fn detect_face(state: &AppState, data: Bytes) -> bool {
    let detector = state.face_detector.clone();
    let result = tokio::task::spawn_blocking(move || detector.detect(&data))
        .await
        .unwrap_or_else(|e| Err(DetectorError::Aborted(e.to_string())));

    has_face_or_assume(result)
}
