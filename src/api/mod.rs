//! HTTP surface

pub mod handlers;
pub mod response;

use crate::extractor::resolver::Resolver;
use crate::relay::engine::{RelayConfig, RelayEngine};
use crate::utils::config::AppSettings;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use response::{ApiError, ApiResponse};

/// Shared, read-only per-process state
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub relay: Arc<RelayEngine>,
}

impl AppState {
    pub fn new(resolver: Arc<Resolver>, relay: Arc<RelayEngine>) -> Self {
        Self { resolver, relay }
    }

    pub fn from_settings(settings: &AppSettings) -> Result<Self, reqwest::Error> {
        let resolver = Arc::new(Resolver::from_settings(settings)?);
        let relay = Arc::new(RelayEngine::new(
            resolver.clone(),
            RelayConfig::from(settings),
        )?);
        Ok(Self::new(resolver, relay))
    }
}

pub fn router(state: AppState) -> Router {
    let tiktok = Router::new()
        .route("/test", get(handlers::api_test))
        .route("/test-simple", get(handlers::api_test_simple))
        .route("/video-info", post(handlers::video_info))
        .route("/download", get(handlers::download));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/tiktok", tiktok)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
