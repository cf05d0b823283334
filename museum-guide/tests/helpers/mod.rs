//! Shared test fixtures: in-process capabilities and orchestrator wiring

#![allow(dead_code)]

use async_trait::async_trait;
use museum_guide::services::{
    Capabilities, LocalizationService, NarrationService, QuotaConfig, QuotaGuard,
    RecognitionConfig, RecognitionOrchestrator, VisionMatcher,
};
use museum_guide::types::{
    AudioClip, CapabilityError, Detection, LabelDetector, SpeechSynthesizer, Translator,
};
use museum_guide::BuildingCatalog;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// PNG signature followed by padding; enough for format sniffing
pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// Detector returning a fixed outcome
pub struct MockDetector {
    outcome: Result<Vec<Detection>, CapabilityError>,
    calls: AtomicUsize,
}

impl MockDetector {
    pub fn labels(labels: &[(&str, f32)]) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(labels
                .iter()
                .map(|(label, confidence)| Detection::new(*label, *confidence))
                .collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: CapabilityError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LabelDetector for MockDetector {
    fn name(&self) -> &'static str {
        "mock-vision"
    }

    async fn detect(&self, _image: &[u8]) -> Result<Vec<Detection>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Translator tagging text with the target language: "[en] ..."
pub struct MockTranslator {
    fail: bool,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &'static str {
        "mock-translate"
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CapabilityError::ServiceUnavailable(
                "translate offline".to_string(),
            ));
        }
        Ok(format!("[{}] {}", target_language, text))
    }
}

/// Synthesizer whose audio bytes are "<language>:<text>"
pub struct MockSynth {
    fail: bool,
    calls: AtomicUsize,
}

impl MockSynth {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynth {
    fn name(&self) -> &'static str {
        "mock-tts"
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CapabilityError::ServiceUnavailable("tts offline".to_string()));
        }
        Ok(AudioClip {
            mime_type: "audio/mpeg".to_string(),
            bytes: format!("{}:{}", language, text).into_bytes(),
        })
    }
}

/// Orchestrator plus handles on its mocks
pub struct Harness {
    pub orchestrator: Arc<RecognitionOrchestrator>,
    pub detector: Arc<MockDetector>,
    pub translator: Arc<MockTranslator>,
    pub synth: Arc<MockSynth>,
}

pub fn demo_config(demo_mode: bool) -> RecognitionConfig {
    RecognitionConfig {
        demo_mode,
        ..RecognitionConfig::default()
    }
}

pub fn quota(per_caller_limit: u32, global_limit: u32) -> QuotaConfig {
    QuotaConfig {
        per_caller_limit,
        global_limit,
        ..QuotaConfig::default()
    }
}

/// Harness over the built-in catalog with working translator and synthesizer
pub fn harness(detector: Arc<MockDetector>, config: RecognitionConfig) -> Harness {
    harness_with(
        detector,
        MockTranslator::working(),
        MockSynth::working(),
        config,
        QuotaConfig::default(),
        BuildingCatalog::builtin(),
    )
}

pub fn harness_with(
    detector: Arc<MockDetector>,
    translator: Arc<MockTranslator>,
    synth: Arc<MockSynth>,
    config: RecognitionConfig,
    quota: QuotaConfig,
    catalog: BuildingCatalog,
) -> Harness {
    let capabilities = Capabilities {
        matcher: VisionMatcher::new(detector.clone(), config.min_match_score),
        localization: LocalizationService::new(
            translator.clone(),
            config.canonical_language.clone(),
        ),
        narration: NarrationService::new(synth.clone()),
    };

    let orchestrator = RecognitionOrchestrator::new(
        Arc::new(catalog),
        Arc::new(QuotaGuard::new(quota)),
        capabilities,
        config,
    );

    Harness {
        orchestrator: Arc::new(orchestrator),
        detector,
        translator,
        synth,
    }
}
