use crate::extractor::models::{SourceTag, VideoRecord};
use crate::extractor::normalize;
use crate::extractor::reference::VideoReference;
use crate::utils::error::SourceError;
use async_trait::async_trait;

/// Untyped `data` payload of one resolver response
pub type RawPayload = serde_json::Value;

/// Core trait for all resolver endpoints
///
/// An extractor knows how to fetch the raw payload for a reference from one
/// upstream service. Normalization is keyed on `tag()` so that every
/// implementation talking to the same provider produces the same record.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Identifier used in logs (e.g. "tikwm")
    fn id(&self) -> &'static str {
        self.tag().as_str()
    }

    /// Normalization rules that apply to this endpoint's payloads
    fn tag(&self) -> SourceTag;

    /// Fetches the `data` payload for a reference
    async fn fetch(&self, reference: &VideoReference) -> Result<RawPayload, SourceError>;

    /// Turns a payload into a record tagged with this endpoint
    fn normalize(&self, payload: RawPayload) -> Result<VideoRecord, SourceError> {
        normalize::normalize(self.tag(), payload)
    }

    /// One complete resolution attempt: fetch, then normalize
    async fn attempt(&self, reference: &VideoReference) -> Result<VideoRecord, SourceError> {
        let payload = self.fetch(reference).await?;
        self.normalize(payload)
    }
}
