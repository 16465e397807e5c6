use crate::dtos::PersonalizedImageResponse;
use crate::services::GALLERY_LIMIT;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

pub async fn list_gallery(
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonalizedImageResponse>>, AppError> {
    let images = state.store.recent_personalized(GALLERY_LIMIT).await?;

    Ok(Json(
        images
            .into_iter()
            .map(PersonalizedImageResponse::from)
            .collect(),
    ))
}

pub async fn get_personalized_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<Json<PersonalizedImageResponse>, AppError> {
    let image = state
        .store
        .find_personalized(&image_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Image not found")))?;

    Ok(Json(PersonalizedImageResponse::from(image)))
}
