pub mod database;
pub mod face_detector;
pub mod metrics;
pub mod providers;

pub use self::database::{MongoDb, PortraitStore, GALLERY_LIMIT};
pub use self::face_detector::{has_face_or_assume, DetectorError, FaceDetector, SeetaFaceDetector};
pub use self::metrics::{get_metrics, init_metrics};
