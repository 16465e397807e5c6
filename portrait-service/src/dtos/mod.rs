pub mod personalized;
pub mod photos;

pub use personalized::{GenerateRequest, PersonalizedImageResponse, DEFAULT_PROMPT};
pub use photos::UploadResponse;

use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 with a fixed millisecond fraction and an explicit `+00:00` offset.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, false)
}
