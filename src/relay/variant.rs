//! Variant selection and download file naming

use crate::extractor::models::{QualityTag, QualityVariant, VideoRecord};
use crate::utils::error::RelayError;

pub const PLATFORM_PREFIX: &str = "tiktok";
pub const MEDIA_EXTENSION: &str = "mp4";

/// Pick the requested quality, else the first available one
pub fn select_variant(
    qualities: &[QualityVariant],
    requested: Option<QualityTag>,
) -> Result<&QualityVariant, RelayError> {
    requested
        .and_then(|quality| qualities.iter().find(|v| v.quality == quality))
        .or_else(|| qualities.first())
        .ok_or(RelayError::NoVariantAvailable)
}

/// `tiktok_<author>_<id>.mp4`, safe for a `Content-Disposition` header
pub fn media_filename(record: &VideoRecord) -> String {
    sanitize_filename(&format!(
        "{PLATFORM_PREFIX}_{}_{}.{MEDIA_EXTENSION}",
        record.author.unique_id, record.id
    ))
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
