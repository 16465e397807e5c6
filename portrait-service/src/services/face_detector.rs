//! Face presence detection.
//!
//! Detection is advisory: callers collapse any [`DetectorError`] to "face
//! present" through [`has_face_or_assume`] so an upload is never rejected
//! because the detector could not run.

use metrics::counter;
use std::sync::Arc;
use thiserror::Error;

use super::metrics::FACE_DETECTION_FALLBACKS;

#[derive(Error, Debug, Clone)]
pub enum DetectorError {
    #[error("Face detector not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to load face model: {0}")]
    Model(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Face detection aborted: {0}")]
    Aborted(String),
}

/// Blocking detector; callers run it on the blocking pool.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &[u8]) -> Result<bool, DetectorError>;
}

/// Collapses a detection result to a plain flag, treating failure as a face.
pub fn has_face_or_assume(result: Result<bool, DetectorError>) -> bool {
    match result {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, "Face detection failed, assuming a face is present");
            counter!(FACE_DETECTION_FALLBACKS).increment(1);
            true
        }
    }
}

/// SeetaFace cascade detector backed by `rustface`.
///
/// The model file is read once at construction. `create_detector_with_model`
/// consumes its model, so each call parses a fresh one from the cached bytes.
pub struct SeetaFaceDetector {
    model: Result<Arc<[u8]>, DetectorError>,
}

impl SeetaFaceDetector {
    const MIN_FACE_SIZE: u32 = 20;
    const SCORE_THRESHOLD: f64 = 2.0;
    const PYRAMID_SCALE_FACTOR: f32 = 0.8;
    const SLIDE_WINDOW_STEP: u32 = 4;

    pub fn new(model_path: Option<String>) -> Self {
        let model = match model_path {
            None => {
                tracing::warn!(
                    "FACE_MODEL_PATH not set, every upload will be flagged as having a face"
                );
                Err(DetectorError::NotConfigured("no model path".to_string()))
            }
            Some(path) => Self::load_model(&path),
        };
        Self { model }
    }

    fn load_model(path: &str) -> Result<Arc<[u8]>, DetectorError> {
        let bytes = std::fs::read(path)
            .map_err(|e| DetectorError::Model(format!("{}: {}", path, e)))
            .and_then(|bytes| {
                rustface::read_model(bytes.as_slice())
                    .map(|_| bytes)
                    .map_err(|e| DetectorError::Model(format!("{}: {}", path, e)))
            });

        match bytes {
            Ok(bytes) => {
                tracing::info!(path = %path, size = bytes.len(), "Loaded face detection model");
                Ok(Arc::from(bytes))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Face detection model unavailable");
                Err(e)
            }
        }
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn detect(&self, image: &[u8]) -> Result<bool, DetectorError> {
        let model_bytes = self.model.as_ref().map_err(Clone::clone)?;
        let model = rustface::read_model(&model_bytes[..])
            .map_err(|e| DetectorError::Model(e.to_string()))?;

        let gray = image::load_from_memory(image)
            .map_err(|e| DetectorError::Decode(e.to_string()))?
            .to_luma8();
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(model);
        detector.set_min_face_size(Self::MIN_FACE_SIZE);
        detector.set_score_thresh(Self::SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(Self::PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(Self::SLIDE_WINDOW_STEP, Self::SLIDE_WINDOW_STEP);

        let mut data = rustface::ImageData::new(gray.as_raw(), width, height);
        let faces = detector.detect(&mut data);

        tracing::debug!(faces = faces.len(), width, height, "Face detection completed");

        Ok(!faces.is_empty())
    }
}
