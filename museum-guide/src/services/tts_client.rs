//! Google Cloud Text-to-Speech client

use crate::services::google_cloud::{GoogleApi, GoogleCloudSettings, TTS_ENDPOINT};
use crate::services::localization::primary_subtag;
use crate::types::{AudioClip, CapabilityError, SpeechSynthesizer};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SynthesizeResponse {
    audio_content: String,
}

pub struct GoogleTtsClient {
    api: GoogleApi,
    /// Preferred voice, used when it speaks the requested language
    voice_name: Option<String>,
}

impl GoogleTtsClient {
    pub fn new(
        settings: GoogleCloudSettings,
        voice_name: Option<String>,
    ) -> Result<Self, CapabilityError> {
        Ok(Self {
            api: GoogleApi::new("text-to-speech", TTS_ENDPOINT, settings)?,
            voice_name,
        })
    }

    fn voice_for(&self, language: &str) -> VoiceSelection {
        let language_code = tts_language_code(language);
        let name = self
            .voice_name
            .as_ref()
            .filter(|v| primary_subtag(v).eq_ignore_ascii_case(primary_subtag(&language_code)))
            .cloned();
        VoiceSelection {
            language_code,
            name,
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    fn name(&self) -> &'static str {
        self.api.service()
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip, CapabilityError> {
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: self.voice_for(language),
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let response: SynthesizeResponse = self.api.post_json(&request).await?;
        let clip = decode_audio(response)?;
        info!(language = %language, bytes = clip.bytes.len(), "Narration synthesized");
        Ok(clip)
    }
}

pub(crate) fn decode_audio(response: SynthesizeResponse) -> Result<AudioClip, CapabilityError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(response.audio_content.as_bytes())
        .map_err(|e| {
            CapabilityError::ServiceUnavailable(format!(
                "text-to-speech audio decode failed: {}",
                e
            ))
        })?;
    Ok(AudioClip {
        mime_type: "audio/mpeg".to_string(),
        bytes,
    })
}

/// BCP-47 code accepted by the TTS API ("en" → "en-US")
///
/// Codes that already carry a region pass through unchanged.
pub fn tts_language_code(language: &str) -> String {
    let language = language.trim();
    if language.contains('-') {
        return language.to_string();
    }
    match language.to_ascii_lowercase().as_str() {
        "ja" => "ja-JP",
        "en" => "en-US",
        "zh" => "cmn-CN",
        "ko" => "ko-KR",
        "fr" => "fr-FR",
        "de" => "de-DE",
        "es" => "es-ES",
        _ => language,
    }
    .to_string()
}
