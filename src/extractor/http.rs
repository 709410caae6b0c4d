//! HTTP-backed resolver endpoint

use crate::extractor::endpoint::ResolverEndpoint;
use crate::extractor::models::SourceTag;
use crate::extractor::reference::VideoReference;
use crate::extractor::traits::{Extractor, RawPayload};
use crate::utils::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Queries one lookup service and hands back the `data` payload
pub struct HttpExtractor {
    client: Client,
    endpoint: ResolverEndpoint,
    timeout: Duration,
}

impl HttpExtractor {
    /// `client` is expected to carry the browser user agent already
    pub fn new(client: Client, endpoint: ResolverEndpoint, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }

    pub fn endpoint(&self) -> &ResolverEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    fn tag(&self) -> SourceTag {
        self.endpoint.tag
    }

    async fn fetch(&self, reference: &VideoReference) -> Result<RawPayload, SourceError> {
        let url = self.endpoint.request_url(reference);
        debug!(source = self.id(), %url, "Trying resolver endpoint");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::from_transport(e, self.timeout))?;

        let status = response.status();
        debug!(source = self.id(), status = status.as_u16(), "Resolver endpoint responded");
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        // A body that is not JSON (rate-limit pages, HTML errors) carries no data
        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout)
            } else {
                debug!(source = self.id(), error = %e, "Resolver body is not JSON");
                SourceError::NoData
            }
        })?;
        extract_data(body)
    }
}

/// Pulls the `data` member out of a response body
fn extract_data(body: Value) -> Result<RawPayload, SourceError> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Null) | Some(Value::Bool(false)) | None => Err(SourceError::NoData),
            Some(Value::String(s)) if s.is_empty() => Err(SourceError::NoData),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(SourceError::NoData),
            Some(data) => Ok(data),
        },
        _ => Err(SourceError::NoData),
    }
}
