//! Route handlers
//!
//! - GET  /health
//! - GET  /api/tiktok/test
//! - GET  /api/tiktok/test-simple
//! - POST /api/tiktok/video-info
//! - GET  /api/tiktok/download?url=&quality=

use crate::api::response::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::extractor::models::{QualityTag, VideoRecord};
use crate::relay::sink::{channel_sink, BodyChunk, ChannelReceiver, MediaHeaders};
use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "TikTok Downloader Server is running!",
        timestamp: Utc::now(),
    })
}

pub async fn api_test() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("TikTok Downloader API is working!").with_timestamp())
}

pub async fn api_test_simple() -> Json<ApiResponse<()>> {
    debug!("Test endpoint called");
    Json(ApiResponse::message("Simple test works! Server is responding.").with_timestamp())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfoRequest {
    #[serde(default)]
    pub tiktok_url: Option<String>,
}

pub async fn video_info(
    State(state): State<AppState>,
    payload: Result<Json<VideoInfoRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VideoRecord>>, ApiError> {
    let Json(request) = payload?;
    let reference = request.tiktok_url.unwrap_or_default();
    info!(%reference, "Analyzing TikTok URL");

    let record = state.resolver.resolve(&reference).await?;

    info!(
        source = %record.source_tag,
        qualities = ?record.available_qualities(),
        "Video analysis completed"
    );
    Ok(Json(ApiResponse::ok("Video analyzed successfully", record)))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub quality: Option<String>,
}

impl DownloadQuery {
    /// Omitted means `standard`; unrecognised values fall back to the first
    /// available variant
    pub fn requested_quality(&self) -> Option<QualityTag> {
        match self.quality.as_deref() {
            None => Some(QualityTag::Standard),
            Some(raw) => raw.parse().ok(),
        }
    }
}

pub async fn download(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let requested = query.requested_quality();
    let reference = query.url.unwrap_or_default();
    let relay_id = Uuid::new_v4();
    info!(%relay_id, %reference, quality = ?requested, "Download request");

    let (mut sink, receiver) = channel_sink(state.relay.config().buffer);
    let relay = state.relay.clone();

    let task = tokio::spawn(
        async move {
            let result = relay.relay(&reference, requested, &mut sink).await;
            match &result {
                Ok(outcome) => debug!(bytes_sent = outcome.bytes_sent, "Relay finished"),
                Err(e) if e.is_post_commit() => warn!(error = %e, "Relay ended after headers were sent"),
                Err(e) => debug!(error = %e, "Relay failed before headers were sent"),
            }
            result
        }
        .instrument(tracing::info_span!("relay", %relay_id)),
    );

    let ChannelReceiver { headers, body } = receiver;

    match headers.await {
        Ok(headers) => streaming_response(headers, body),
        // The sink was dropped without committing: the relay already failed
        Err(_) => match task.await {
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok(_)) => Err(ApiError::internal(
                "Download failed",
                "relay finished without sending headers",
            )),
            Err(join_error) => {
                error!(%relay_id, error = %join_error, "Relay task aborted");
                Err(ApiError::internal("Download failed", join_error.to_string()))
            }
        },
    }
}

fn streaming_response(
    headers: MediaHeaders,
    body: mpsc::Receiver<BodyChunk>,
) -> Result<Response, ApiError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_DISPOSITION, headers.content_disposition())
        .header(header::CONTENT_TYPE, headers.content_type)
        .header(header::CACHE_CONTROL, headers.cache_control);

    if let Some(length) = headers.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(ReceiverStream::new(body)))
        .map_err(|e| ApiError::internal("Download failed", e.to_string()))
}
