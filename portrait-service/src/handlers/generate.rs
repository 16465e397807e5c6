use crate::dtos::{GenerateRequest, PersonalizedImageResponse};
use crate::models::PersonalizedImage;
use crate::services::metrics::{IMAGES_GENERATED, IMAGE_GENERATION_FAILURES};
use crate::services::providers::{GenerationSession, ImageRequest, OutputModality};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use metrics::counter;
use service_core::error::AppError;

pub async fn generate_personalized_image(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<PersonalizedImageResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(anyhow::anyhow!("{}", e)))?;
    let prompt = request.resolved_prompt();

    // 1. The source photo must exist now; it is not re-checked later.
    let photo = state
        .store
        .find_photo(&request.photo_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Photo not found")))?;

    // 2. Credential is read per call so a missing key only fails generation.
    let api_key = state
        .config
        .generation
        .api_key
        .clone()
        .ok_or_else(|| AppError::Misconfigured(anyhow::anyhow!("API key not configured")))?;

    let session = GenerationSession::new(api_key, state.config.generation.model.clone());

    tracing::info!(
        photo_id = %photo.id,
        session_id = %session.session_id,
        model = %session.model,
        "Image generation started"
    );

    let provider_request = ImageRequest {
        prompt: prompt.clone(),
        source_image: photo.image_data,
        source_mime_type: photo.content_type,
        modalities: vec![OutputModality::Image, OutputModality::Text],
    };

    // 3. No timeout or retry here; the provider call simply runs to completion.
    let response = state
        .provider
        .generate(&session, &provider_request)
        .await
        .map_err(|e| {
            counter!(IMAGE_GENERATION_FAILURES).increment(1);
            tracing::error!(session_id = %session.session_id, "Image generation failed: {}", e);
            AppError::Upstream(anyhow::anyhow!("{}", e))
        })?;

    let generated = response.images.into_iter().next().ok_or_else(|| {
        counter!(IMAGE_GENERATION_FAILURES).increment(1);
        AppError::Upstream(anyhow::anyhow!("No image generated"))
    })?;

    // 4. Persist the first image only.
    let record = PersonalizedImage::new(
        request.photo_id,
        generated.data,
        generated.mime_type,
        prompt,
        response.text,
    );

    state.store.insert_personalized(&record).await?;
    counter!(IMAGES_GENERATED).increment(1);

    tracing::info!(
        personalized_id = %record.id,
        photo_id = %record.original_photo_id,
        session_id = %session.session_id,
        "Image generation completed successfully"
    );

    Ok(Json(PersonalizedImageResponse::from(record)))
}
