//! Narration Service
//!
//! Produces the audio guide for a matched building: the precomputed asset
//! when the visitor reads the canonical language and one exists, otherwise
//! speech synthesized from the (possibly translated) description.

use crate::types::{CapabilityError, Narration, SpeechSynthesizer};
use museum_common::Building;
use std::sync::Arc;
use tracing::debug;

pub struct NarrationService {
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl NarrationService {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { synthesizer }
    }

    /// Narrate `text` for `building`
    ///
    /// `canonical` says whether `text` is in the canonical language (and so
    /// matches the precomputed audio guide).
    pub async fn narrate(
        &self,
        building: &Building,
        text: &str,
        language: &str,
        canonical: bool,
    ) -> Result<Narration, CapabilityError> {
        if canonical {
            if let Some(asset) = &building.audio_guide {
                debug!(building_id = %building.id, asset = %asset, "Using precomputed audio guide");
                return Ok(Narration::Asset(asset.clone()));
            }
        }

        debug!(
            synthesizer = self.synthesizer.name(),
            building_id = %building.id,
            language = %language,
            "Synthesizing narration"
        );
        let clip = self.synthesizer.synthesize(text, language).await?;
        Ok(Narration::Inline(clip))
    }
}
