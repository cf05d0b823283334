//! End-to-end recognition pipeline tests against in-process capabilities

mod helpers;

use helpers::{
    demo_config, harness, harness_with, quota, MockDetector, MockSynth, MockTranslator, PNG,
};
use museum_guide::services::{
    QuotaConfig, RecognitionError, RejectReason, DEMO_PLACEHOLDER_TEXT,
};
use museum_guide::types::{CapabilityError, Narration, RecognitionRequest};
use museum_guide::BuildingCatalog;

const MEIJI_DESCRIPTION: &str = "明治22年に建設された木造建築の傑作...";

fn request(caller: &str) -> RecognitionRequest {
    RecognitionRequest::new(PNG.to_vec(), caller)
}

// ============================================================================
// Matching and localization
// ============================================================================

#[tokio::test]
async fn test_meiji_hall_in_english() {
    let h = harness(
        MockDetector::labels(&[("meiji-hall", 0.9), ("wooden architecture", 0.9)]),
        demo_config(false),
    );

    let result = h
        .orchestrator
        .recognize(request("visitor-1").with_language("en"))
        .await
        .unwrap();

    let building = result.building.as_ref().expect("building matched");
    assert_eq!(building.id, "meiji-main-hall");
    assert!(result.confidence >= 0.5);
    assert!(!result.demo_fallback);
    assert_eq!(result.language, "en");

    let description = result.description.as_deref().unwrap();
    assert_ne!(description, MEIJI_DESCRIPTION);
    assert_eq!(description, format!("[en] {}", MEIJI_DESCRIPTION));

    // English has no precomputed guide, so narration is synthesized
    match result.audio {
        Some(Narration::Inline(clip)) => {
            assert_eq!(clip.bytes, format!("en:[en] {}", MEIJI_DESCRIPTION).into_bytes());
        }
        other => panic!("expected synthesized audio, got {:?}", other),
    }
    assert_eq!(h.translator.calls(), 1);
    assert_eq!(h.synth.calls(), 1);
}

#[tokio::test]
async fn test_exact_name_canonical_uses_asset_without_upstream_calls() {
    let h = harness(
        MockDetector::labels(&[("本館（明治記念館）", 0.95)]),
        demo_config(false),
    );

    let result = h.orchestrator.recognize(request("visitor-1")).await.unwrap();

    assert_eq!(result.building.as_ref().unwrap().id, "meiji-main-hall");
    assert!((result.confidence - 0.95).abs() < 1e-6);
    assert_eq!(result.description.as_deref(), Some(MEIJI_DESCRIPTION));
    assert_eq!(result.language, "ja");
    assert_eq!(
        result.audio,
        Some(Narration::Asset("/audio/meiji-hall-guide.mp3".to_string()))
    );
    assert_eq!(h.translator.calls(), 0);
    assert_eq!(h.synth.calls(), 0);
}

#[tokio::test]
async fn test_regional_canonical_tag_skips_translation() {
    let h = harness(
        MockDetector::labels(&[("本館（明治記念館）", 0.95)]),
        demo_config(false),
    );

    let result = h
        .orchestrator
        .recognize(request("visitor-1").with_language("ja-JP"))
        .await
        .unwrap();

    assert_eq!(result.description.as_deref(), Some(MEIJI_DESCRIPTION));
    assert_eq!(result.language, "ja");
    assert_eq!(h.translator.calls(), 0);
}

#[tokio::test]
async fn test_building_without_asset_is_synthesized() {
    let h = harness(
        MockDetector::labels(&[("Taisho Library", 0.8)]),
        demo_config(false),
    );

    let result = h.orchestrator.recognize(request("visitor-1")).await.unwrap();

    assert_eq!(result.building.as_ref().unwrap().id, "taisho-library");
    assert!(matches!(result.audio, Some(Narration::Inline(_))));
    assert_eq!(h.synth.calls(), 1);
}

#[tokio::test]
async fn test_unrelated_labels_no_match_counts_quota_once() {
    let h = harness(
        MockDetector::labels(&[("cat", 0.99), ("sky", 0.97)]),
        demo_config(false),
    );

    let result = h
        .orchestrator
        .recognize(request("visitor-1").with_language("en"))
        .await
        .unwrap();

    assert!(!result.is_match());
    assert!(result.description.is_none());
    assert!(result.audio.is_none());
    assert!(!result.demo_fallback);
    assert_eq!(h.orchestrator.quota().global_usage(), 1);
    assert_eq!(h.translator.calls(), 0);
    assert_eq!(h.synth.calls(), 0);
}

// ============================================================================
// Degradation
// ============================================================================

#[tokio::test]
async fn test_translation_failure_falls_back_to_canonical() {
    let h = harness_with(
        MockDetector::labels(&[("本館（明治記念館）", 0.95)]),
        MockTranslator::failing(),
        MockSynth::working(),
        demo_config(false),
        QuotaConfig::default(),
        BuildingCatalog::builtin(),
    );

    let result = h
        .orchestrator
        .recognize(request("visitor-1").with_language("en"))
        .await
        .unwrap();

    assert_eq!(result.description.as_deref(), Some(MEIJI_DESCRIPTION));
    assert_eq!(result.language, "ja");
    // Canonical text again, so the precomputed guide applies
    assert_eq!(
        result.audio,
        Some(Narration::Asset("/audio/meiji-hall-guide.mp3".to_string()))
    );
    assert!(!result.demo_fallback);
}

#[tokio::test]
async fn test_narration_failure_drops_audio_only() {
    let h = harness_with(
        MockDetector::labels(&[("Taisho Library", 0.8)]),
        MockTranslator::working(),
        MockSynth::failing(),
        demo_config(false),
        QuotaConfig::default(),
        BuildingCatalog::builtin(),
    );

    let result = h
        .orchestrator
        .recognize(request("visitor-1").with_language("en"))
        .await
        .unwrap();

    assert_eq!(result.building.as_ref().unwrap().id, "taisho-library");
    assert!(result.description.as_deref().unwrap().starts_with("[en] "));
    assert!(result.audio.is_none());
    assert!(!result.demo_fallback);
}

// ============================================================================
// Vision failures and demo mode
// ============================================================================

#[tokio::test]
async fn test_vision_failure_demo_mode_serves_fallback() {
    let h = harness(
        MockDetector::failing(CapabilityError::ServiceUnavailable("timeout".to_string())),
        demo_config(true),
    );

    let result = h.orchestrator.recognize(request("visitor-1")).await.unwrap();

    assert!(result.demo_fallback);
    assert_eq!(result.building.as_ref().unwrap().id, "meiji-main-hall");
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.description.as_deref(), Some(MEIJI_DESCRIPTION));
    assert_eq!(
        result.audio,
        Some(Narration::Asset("/audio/meiji-hall-guide.mp3".to_string()))
    );
}

#[tokio::test]
async fn test_demo_fallback_makes_no_further_calls() {
    let h = harness(
        MockDetector::failing(CapabilityError::QuotaExceededUpstream),
        demo_config(true),
    );

    let result = h
        .orchestrator
        .recognize(request("visitor-1").with_language("en"))
        .await
        .unwrap();

    assert!(result.demo_fallback);
    assert_eq!(result.language, "ja");
    assert_eq!(result.description.as_deref(), Some(MEIJI_DESCRIPTION));
    assert!(result.audio.is_none());
    assert_eq!(h.translator.calls(), 0);
    assert_eq!(h.synth.calls(), 0);
}

#[tokio::test]
async fn test_demo_fallback_with_empty_catalog() {
    let h = harness_with(
        MockDetector::failing(CapabilityError::ServiceUnavailable("down".to_string())),
        MockTranslator::working(),
        MockSynth::working(),
        demo_config(true),
        QuotaConfig::default(),
        BuildingCatalog::new(Vec::new()).unwrap(),
    );

    let result = h.orchestrator.recognize(request("visitor-1")).await.unwrap();

    assert!(result.demo_fallback);
    assert!(result.building.is_none());
    assert_eq!(result.description.as_deref(), Some(DEMO_PLACEHOLDER_TEXT));
}

#[tokio::test]
async fn test_vision_failure_without_demo_mode_is_error() {
    let h = harness(
        MockDetector::failing(CapabilityError::ServiceUnavailable("timeout".to_string())),
        demo_config(false),
    );
    let err = h.orchestrator.recognize(request("visitor-1")).await.unwrap_err();
    assert!(matches!(err, RecognitionError::UpstreamUnavailable(_)));

    let h = harness(
        MockDetector::failing(CapabilityError::QuotaExceededUpstream),
        demo_config(false),
    );
    let err = h.orchestrator.recognize(request("visitor-1")).await.unwrap_err();
    assert!(matches!(err, RecognitionError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_invalid_image_surfaces_even_in_demo_mode() {
    let h = harness(MockDetector::labels(&[("Meiji Hall", 0.9)]), demo_config(true));

    let err = h
        .orchestrator
        .recognize(RecognitionRequest::new(b"plain text, not a photo".to_vec(), "visitor-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RecognitionError::InvalidInput(_)));

    let err = h
        .orchestrator
        .recognize(RecognitionRequest::new(Vec::new(), "visitor-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RecognitionError::InvalidInput(_)));

    assert_eq!(h.detector.calls(), 0);
}

#[tokio::test]
async fn test_upstream_rejected_image_is_invalid_input() {
    let h = harness(
        MockDetector::failing(CapabilityError::InvalidImage("Bad image data.".to_string())),
        demo_config(true),
    );

    let err = h.orchestrator.recognize(request("visitor-1")).await.unwrap_err();
    assert_eq!(err, RecognitionError::InvalidInput("Bad image data.".to_string()));
}

// ============================================================================
// Quota
// ============================================================================

#[tokio::test]
async fn test_per_caller_limit_rejects_before_vision() {
    let h = harness_with(
        MockDetector::labels(&[("Meiji Hall", 0.9)]),
        MockTranslator::working(),
        MockSynth::working(),
        demo_config(false),
        quota(2, 100),
        BuildingCatalog::builtin(),
    );

    assert!(h.orchestrator.recognize(request("visitor-1")).await.is_ok());
    assert!(h.orchestrator.recognize(request("visitor-1")).await.is_ok());

    let err = h.orchestrator.recognize(request("visitor-1")).await.unwrap_err();
    assert_eq!(
        err,
        RecognitionError::RateLimited(RejectReason::PerCallerLimitExceeded)
    );
    assert_eq!(h.detector.calls(), 2);

    // A different caller still gets through
    assert!(h.orchestrator.recognize(request("visitor-2")).await.is_ok());
}

#[tokio::test]
async fn test_global_limit_across_callers() {
    let h = harness_with(
        MockDetector::labels(&[("Meiji Hall", 0.9)]),
        MockTranslator::working(),
        MockSynth::working(),
        demo_config(false),
        quota(10, 2),
        BuildingCatalog::builtin(),
    );

    assert!(h.orchestrator.recognize(request("a")).await.is_ok());
    assert!(h.orchestrator.recognize(request("b")).await.is_ok());
    let err = h.orchestrator.recognize(request("c")).await.unwrap_err();
    assert_eq!(err, RecognitionError::RateLimited(RejectReason::GlobalLimitExceeded));
}

#[tokio::test]
async fn test_allow_list_rejects_unknown_callers() {
    let h = harness_with(
        MockDetector::labels(&[("Meiji Hall", 0.9)]),
        MockTranslator::working(),
        MockSynth::working(),
        demo_config(false),
        QuotaConfig {
            allowed_callers: vec!["10.0.0.5".to_string()],
            ..QuotaConfig::default()
        },
        BuildingCatalog::builtin(),
    );

    let err = h.orchestrator.recognize(request("203.0.113.9")).await.unwrap_err();
    assert_eq!(err, RecognitionError::RateLimited(RejectReason::CallerNotAllowed));
    assert_eq!(h.detector.calls(), 0);
    assert_eq!(h.orchestrator.quota().global_usage(), 0);

    assert!(h.orchestrator.recognize(request("10.0.0.5")).await.is_ok());
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let h = harness(MockDetector::labels(&[("Meiji Hall", 0.9)]), demo_config(false));

    let first = h.orchestrator.recognize(request("visitor-1")).await.unwrap();
    let second = h.orchestrator.recognize(request("visitor-1")).await.unwrap();
    assert_ne!(first.request_id, second.request_id);
}
