//! Service modules for the recognition pipeline
//!
//! Pipeline stages (quota, matching, localization, narration) plus the
//! Google Cloud clients that back the external capabilities.

pub mod google_cloud;
pub mod localization;
pub mod narration;
pub mod quota_guard;
pub mod recognition_orchestrator;
pub mod translate_client;
pub mod tts_client;
pub mod vision_client;
pub mod vision_matcher;

pub use google_cloud::GoogleCloudSettings;
pub use localization::LocalizationService;
pub use narration::NarrationService;
pub use quota_guard::{Admission, QuotaConfig, QuotaGuard, QuotaSnapshot, RejectReason};
pub use recognition_orchestrator::{
    Capabilities, RecognitionConfig, RecognitionError, RecognitionOrchestrator,
    DEMO_PLACEHOLDER_TEXT,
};
pub use translate_client::GoogleTranslateClient;
pub use tts_client::GoogleTtsClient;
pub use vision_client::GoogleVisionClient;
pub use vision_matcher::{Candidate, MatchOutcome, VisionMatcher};
