//! Recognition Orchestrator
//!
//! Runs one recognition request through the pipeline:
//!
//! ```text
//! Pending → QuotaChecked → Matched | NoMatch → Localized → Narrated → Completed
//!                               └──────────→ Fallback (demo mode only)
//! ```
//!
//! Steps run sequentially per request; requests run independently. Only the
//! quota check touches shared mutable state. Localization and narration are
//! best-effort: their failures degrade the result instead of failing it.

use crate::catalog::BuildingCatalog;
use crate::services::localization::LocalizationService;
use crate::services::narration::NarrationService;
use crate::services::quota_guard::{Admission, QuotaGuard, RejectReason};
use crate::services::vision_matcher::{MatchOutcome, VisionMatcher};
use crate::types::{CapabilityError, Narration, RecognitionRequest, RecognitionResult};
use museum_common::Building;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Description used when demo mode has no catalog building to show
pub const DEMO_PLACEHOLDER_TEXT: &str = "Demo mode: API call simulated";

/// Pipeline settings supplied by the surrounding application
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Replace vision failures with a deterministic placeholder result
    pub demo_mode: bool,
    /// Language catalog descriptions are written in
    pub canonical_language: String,
    /// Minimum candidate score for a match
    pub min_match_score: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            demo_mode: false,
            canonical_language: "ja".to_string(),
            min_match_score: 0.5,
        }
    }
}

/// Errors surfaced to the caller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError {
    /// Quota Guard refused the request
    #[error("Rate limited: {0}")]
    RateLimited(RejectReason),

    /// Vision capability failed and demo mode is off
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Image payload malformed or unsupported
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// External capabilities used by the pipeline
pub struct Capabilities {
    pub matcher: VisionMatcher,
    pub localization: LocalizationService,
    pub narration: NarrationService,
}

pub struct RecognitionOrchestrator {
    catalog: Arc<BuildingCatalog>,
    quota: Arc<QuotaGuard>,
    matcher: VisionMatcher,
    localization: LocalizationService,
    narration: NarrationService,
    config: RecognitionConfig,
}

impl RecognitionOrchestrator {
    pub fn new(
        catalog: Arc<BuildingCatalog>,
        quota: Arc<QuotaGuard>,
        capabilities: Capabilities,
        config: RecognitionConfig,
    ) -> Self {
        Self {
            catalog,
            quota,
            matcher: capabilities.matcher,
            localization: capabilities.localization,
            narration: capabilities.narration,
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<BuildingCatalog> {
        &self.catalog
    }

    pub fn quota(&self) -> &Arc<QuotaGuard> {
        &self.quota
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Recognize the building in `request.image`
    pub async fn recognize(
        &self,
        request: RecognitionRequest,
    ) -> Result<RecognitionResult, RecognitionError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("recognition", %request_id, caller = %request.caller_id);
        self.run(request_id, request).instrument(span).await
    }

    async fn run(
        &self,
        request_id: Uuid,
        request: RecognitionRequest,
    ) -> Result<RecognitionResult, RecognitionError> {
        // Pending → QuotaChecked
        if let Admission::Rejected(reason) = self.quota.admit(&request.caller_id) {
            warn!(%reason, "Recognition rejected by quota guard");
            return Err(RecognitionError::RateLimited(reason));
        }
        debug!(stage = "quota_checked", "Request admitted");

        let requested = request.language.as_deref();
        let canonical_requested = self.localization.is_canonical(requested);
        let target_language = self.resolved_language(requested);

        // QuotaChecked → Matched | NoMatch | Fallback
        let detections = match self.matcher.detect(&request.image).await {
            Ok(detections) => detections,
            Err(CapabilityError::InvalidImage(msg)) => {
                info!(%msg, "Rejecting invalid image");
                return Err(RecognitionError::InvalidInput(msg));
            }
            Err(err) if self.config.demo_mode => {
                warn!(error = %err, "Vision unavailable, serving demo fallback");
                return Ok(self.demo_fallback(request_id, canonical_requested));
            }
            Err(err) => {
                warn!(error = %err, "Vision unavailable");
                return Err(RecognitionError::UpstreamUnavailable(err.to_string()));
            }
        };

        let candidate = match self.matcher.best_match(&self.catalog, &detections) {
            MatchOutcome::Matched(candidate) => candidate,
            MatchOutcome::NoMatch { best_score } => {
                info!(best_score, detections = detections.len(), "No building matched");
                return Ok(no_match(request_id, target_language));
            }
        };

        let Some(building) = self.catalog.get(&candidate.building_id).cloned() else {
            warn!(building_id = %candidate.building_id, "Candidate missing from catalog");
            return Ok(no_match(request_id, target_language));
        };
        debug!(stage = "matched", building_id = %building.id, score = candidate.score);

        // Matched → Localized
        let (description, language, text_is_canonical) =
            match self.localization.translate(&building.description, requested).await {
                Ok(text) => (text, target_language, canonical_requested),
                Err(err) => {
                    warn!(
                        error = %err,
                        target = %target_language,
                        "Translation failed, using canonical description"
                    );
                    (
                        building.description.clone(),
                        self.config.canonical_language.clone(),
                        true,
                    )
                }
            };
        debug!(stage = "localized", language = %language);

        // Localized → Narrated
        let audio = match self
            .narration
            .narrate(&building, &description, &language, text_is_canonical)
            .await
        {
            Ok(narration) => Some(narration),
            Err(err) => {
                warn!(error = %err, "Narration failed, returning result without audio");
                None
            }
        };
        debug!(stage = "narrated", has_audio = audio.is_some());

        info!(
            building_id = %building.id,
            confidence = candidate.score,
            language = %language,
            "Recognition completed"
        );

        Ok(RecognitionResult {
            request_id,
            building: Some(building),
            confidence: candidate.score,
            description: Some(description),
            language,
            audio,
            demo_fallback: false,
        })
    }

    /// Deterministic placeholder used when vision fails in demo mode
    ///
    /// No further external calls are made: the first catalog building is
    /// returned with its canonical description and, for canonical-language
    /// requests, its precomputed audio guide.
    fn demo_fallback(&self, request_id: Uuid, canonical_requested: bool) -> RecognitionResult {
        let canonical = self.config.canonical_language.clone();

        match self.catalog.first() {
            Some(building) => RecognitionResult {
                request_id,
                building: Some(building.clone()),
                confidence: 0.0,
                description: Some(building.description.clone()),
                language: canonical,
                audio: demo_audio(building, canonical_requested),
                demo_fallback: true,
            },
            None => RecognitionResult {
                request_id,
                building: None,
                confidence: 0.0,
                description: Some(DEMO_PLACEHOLDER_TEXT.to_string()),
                language: canonical,
                audio: None,
                demo_fallback: true,
            },
        }
    }

    fn resolved_language(&self, requested: Option<&str>) -> String {
        match requested {
            Some(lang) if !self.localization.is_canonical(Some(lang)) => lang.trim().to_string(),
            _ => self.config.canonical_language.clone(),
        }
    }
}

fn no_match(request_id: Uuid, language: String) -> RecognitionResult {
    RecognitionResult {
        request_id,
        building: None,
        confidence: 0.0,
        description: None,
        language,
        audio: None,
        demo_fallback: false,
    }
}

fn demo_audio(building: &Building, canonical_requested: bool) -> Option<Narration> {
    if canonical_requested {
        building.audio_guide.clone().map(Narration::Asset)
    } else {
        None
    }
}
