//! Core types and capability traits for the recognition pipeline
//!
//! The three external capabilities (label detection, translation, speech
//! synthesis) are traits so the orchestrator can run against Google Cloud in
//! production and against in-process fakes in tests.
//!
//! # Request lifecycle
//! ```text
//! Pending → QuotaChecked → Matched | NoMatch → Localized → Narrated → Completed
//!                               └──────────→ Fallback (demo mode)
//! ```

use museum_common::Building;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Capability errors
// ============================================================================

/// Failure reported by an external capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// Service unreachable, misconfigured, disabled, or returned an unexpected error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The image payload was rejected (malformed or unsupported)
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Upstream provider quota exhausted (HTTP 429)
    #[error("Upstream quota exceeded")]
    QuotaExceededUpstream,
}

// ============================================================================
// Capabilities
// ============================================================================

/// One raw detection from the vision capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detected label or landmark name
    pub label: String,
    /// Detection confidence (0.0-1.0)
    pub confidence: f32,
}

impl Detection {
    /// Create a detection with clamped confidence (0.0-1.0)
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
        }
    }
}

/// Image label / landmark detection capability
#[async_trait::async_trait]
pub trait LabelDetector: Send + Sync {
    /// Capability name for logging
    fn name(&self) -> &'static str;

    /// Detect labels and landmarks in an image
    async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>, CapabilityError>;
}

/// Text translation capability
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate `text` from `source_language` into `target_language`
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, CapabilityError>;
}

/// Synthesized audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// MIME type of `bytes` (e.g. "audio/mpeg")
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Text-to-speech capability
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Synthesize `text` spoken in `language`
    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip, CapabilityError>;
}

// ============================================================================
// Request / result
// ============================================================================

/// One recognition call
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    /// Raw image bytes as uploaded
    pub image: Vec<u8>,
    /// Caller identity used for quota accounting
    pub caller_id: String,
    /// Requested language; `None` means the canonical language
    pub language: Option<String>,
}

impl RecognitionRequest {
    pub fn new(image: Vec<u8>, caller_id: impl Into<String>) -> Self {
        Self {
            image,
            caller_id: caller_id.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Narration attached to a result
#[derive(Debug, Clone, PartialEq)]
pub enum Narration {
    /// Precomputed audio asset reference
    Asset(String),
    /// Freshly synthesized audio
    Inline(AudioClip),
}

/// Outcome of one recognition call
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    /// Correlation id, also present in log lines for the request
    pub request_id: Uuid,
    /// Matched building, `None` when nothing in the catalog matched
    pub building: Option<Building>,
    /// Match score (0.0-1.0); 0.0 for fallback and no-match results
    pub confidence: f32,
    /// Description in `language`
    pub description: Option<String>,
    /// Language the description is actually written in
    pub language: String,
    pub audio: Option<Narration>,
    /// Served from the demo placeholder path
    pub demo_fallback: bool,
}

impl RecognitionResult {
    pub fn is_match(&self) -> bool {
        self.building.is_some()
    }
}
