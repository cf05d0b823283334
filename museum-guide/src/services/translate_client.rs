//! Google Cloud Translation client (v2 REST)

use crate::services::google_cloud::{GoogleApi, GoogleCloudSettings, TRANSLATE_ENDPOINT};
use crate::types::{CapabilityError, Translator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateResponse {
    data: TranslationsData,
}

#[derive(Debug, Deserialize)]
struct TranslationsData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

pub struct GoogleTranslateClient {
    api: GoogleApi,
}

impl GoogleTranslateClient {
    pub fn new(settings: GoogleCloudSettings) -> Result<Self, CapabilityError> {
        Ok(Self {
            api: GoogleApi::new("translate", TRANSLATE_ENDPOINT, settings)?,
        })
    }
}

#[async_trait::async_trait]
impl Translator for GoogleTranslateClient {
    fn name(&self) -> &'static str {
        self.api.service()
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, CapabilityError> {
        let request = TranslateRequest {
            q: text,
            source: source_language,
            target: target_language,
            format: "text",
        };

        let response: TranslateResponse = self.api.post_json(&request).await?;
        first_translation(response)
    }
}

pub(crate) fn first_translation(response: TranslateResponse) -> Result<String, CapabilityError> {
    response
        .data
        .translations
        .into_iter()
        .next()
        .map(|t| t.translated_text)
        .ok_or_else(|| {
            CapabilityError::ServiceUnavailable("translate returned no translations".to_string())
        })
}
