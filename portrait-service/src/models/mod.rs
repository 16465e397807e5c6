pub mod personalized_image;
pub mod photo;

pub use personalized_image::{PersonalizedImage, TEMPLATE_LABEL};
pub use photo::Photo;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the store's datetime precision, so a timestamp returned to
/// the caller equals the one read back later.
pub(crate) fn store_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
