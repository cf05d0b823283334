//! museum-guide library interface
//!
//! Exposes the recognition pipeline and the HTTP router for the binary and
//! for integration testing.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use crate::catalog::BuildingCatalog;
pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use config::GuideSettings;
use services::{
    Capabilities, GoogleTranslateClient, GoogleTtsClient, GoogleVisionClient,
    LocalizationService, NarrationService, QuotaGuard, RecognitionOrchestrator, VisionMatcher,
};
use std::net::IpAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use types::CapabilityError;

/// Largest accepted image upload
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RecognitionOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub app_name: Arc<str>,
    /// Peers whose `X-Forwarded-For` header is believed
    pub trusted_proxies: Arc<[IpAddr]>,
}

impl AppState {
    pub fn new(
        orchestrator: impl Into<Arc<RecognitionOrchestrator>>,
        app_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            orchestrator: orchestrator.into(),
            startup_time: Utc::now(),
            app_name: app_name.into(),
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = proxies.into();
        self
    }
}

/// Google Cloud backed capabilities for `settings`
pub fn google_capabilities(settings: &GuideSettings) -> Result<Capabilities, CapabilityError> {
    let vision = GoogleVisionClient::new(settings.google.clone())?;
    let translate = GoogleTranslateClient::new(settings.google.clone())?;
    let tts = GoogleTtsClient::new(settings.google.clone(), settings.tts_voice.clone())?;

    Ok(Capabilities {
        matcher: VisionMatcher::new(Arc::new(vision), settings.recognition.min_match_score),
        localization: LocalizationService::new(
            Arc::new(translate),
            settings.recognition.canonical_language.clone(),
        ),
        narration: NarrationService::new(Arc::new(tts)),
    })
}

/// Assemble the orchestrator from resolved settings
pub fn build_orchestrator(
    settings: &GuideSettings,
    catalog: BuildingCatalog,
) -> Result<RecognitionOrchestrator, CapabilityError> {
    let capabilities = google_capabilities(settings)?;
    Ok(RecognitionOrchestrator::new(
        Arc::new(catalog),
        Arc::new(QuotaGuard::new(settings.quota.clone())),
        capabilities,
        settings.recognition.clone(),
    ))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::recognize_routes())
        .merge(api::building_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
