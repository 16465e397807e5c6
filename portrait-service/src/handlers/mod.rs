pub mod gallery;
pub mod generate;
pub mod health;
pub mod photos;

pub use gallery::{get_personalized_image, list_gallery};
pub use generate::generate_personalized_image;
pub use health::{health_check, metrics_endpoint, readiness_check, root};
pub use photos::upload_photo;
