use crate::extractor::http::HttpExtractor;
use crate::extractor::models::VideoRecord;
use crate::extractor::reference::VideoReference;
use crate::extractor::traits::Extractor;
use crate::utils::config::AppSettings;
use crate::utils::error::{ResolutionError, SourceError};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reason reported when there were no endpoints to try at all
const NO_SOURCES: &str = "All APIs failed";

/// The Resolver
///
/// Holds the ordered list of configured extractors and walks it until one
/// of them produces a record. Endpoints are never raced and never retried:
/// a failed endpoint is skipped once per call.
pub struct Resolver {
    extractors: Vec<Arc<dyn Extractor>>,
    accepted_hosts: Vec<String>,
}

impl Resolver {
    /// Create a new Resolver with the given extractors in priority order
    pub fn new(extractors: Vec<Arc<dyn Extractor>>, accepted_hosts: Vec<String>) -> Self {
        Self {
            extractors,
            accepted_hosts,
        }
    }

    /// One [`HttpExtractor`] per configured endpoint, sharing a client
    pub fn from_settings(settings: &AppSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(&settings.user_agent).build()?;

        let extractors = settings
            .endpoints
            .iter()
            .cloned()
            .map(|endpoint| {
                Arc::new(HttpExtractor::new(
                    client.clone(),
                    endpoint,
                    settings.resolver_timeout,
                )) as Arc<dyn Extractor>
            })
            .collect();

        Ok(Self::new(extractors, settings.accepted_hosts.clone()))
    }

    pub fn extractors(&self) -> &[Arc<dyn Extractor>] {
        &self.extractors
    }

    /// Validate a caller-supplied link without touching the network
    pub fn parse_reference(&self, input: &str) -> Result<VideoReference, ResolutionError> {
        VideoReference::parse(input, &self.accepted_hosts)
    }

    /// Validate `input`, then resolve it
    pub async fn resolve(&self, input: &str) -> Result<VideoRecord, ResolutionError> {
        let reference = self.parse_reference(input)?;
        self.resolve_reference(&reference).await
    }

    /// Try each extractor in order; the first usable record wins
    pub async fn resolve_reference(
        &self,
        reference: &VideoReference,
    ) -> Result<VideoRecord, ResolutionError> {
        let mut last_error: Option<SourceError> = None;

        for extractor in &self.extractors {
            debug!(source = extractor.id(), %reference, "Routing to extractor");
            match extractor.attempt(reference).await {
                Ok(record) => {
                    info!(
                        source = extractor.id(),
                        video_id = %record.id,
                        qualities = ?record.available_qualities(),
                        "Resolved video"
                    );
                    return Ok(record);
                }
                Err(e) => {
                    warn!(
                        source = extractor.id(),
                        error = %e,
                        detail = ?e,
                        "Extractor failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| NO_SOURCES.to_string());
        warn!(%reference, %last_error, "All resolver endpoints failed");
        Err(ResolutionError::AllSourcesFailed { last_error })
    }
}
