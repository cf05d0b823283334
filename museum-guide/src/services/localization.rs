//! Localization Service
//!
//! Translates catalog descriptions from the canonical language into the
//! visitor's language. Requests for the canonical language never reach the
//! translation capability.

use crate::types::{CapabilityError, Translator};
use std::sync::Arc;
use tracing::debug;

pub struct LocalizationService {
    translator: Arc<dyn Translator>,
    canonical_language: String,
}

impl LocalizationService {
    pub fn new(translator: Arc<dyn Translator>, canonical_language: impl Into<String>) -> Self {
        Self {
            translator,
            canonical_language: canonical_language.into(),
        }
    }

    pub fn canonical_language(&self) -> &str {
        &self.canonical_language
    }

    /// Whether `language` resolves to the canonical language
    ///
    /// `None` means "unspecified" and is canonical. Primary subtags are
    /// compared case-insensitively, so `ja-JP` is canonical when `ja` is.
    pub fn is_canonical(&self, language: Option<&str>) -> bool {
        match language.map(str::trim) {
            None | Some("") => true,
            Some(lang) => primary_subtag(lang)
                .eq_ignore_ascii_case(primary_subtag(&self.canonical_language)),
        }
    }

    /// Translate `text` into `target_language`
    ///
    /// Identity for the canonical language; otherwise delegates upstream.
    pub async fn translate(
        &self,
        text: &str,
        target_language: Option<&str>,
    ) -> Result<String, CapabilityError> {
        let target = match target_language {
            Some(lang) if !self.is_canonical(Some(lang)) => lang.trim(),
            _ => return Ok(text.to_string()),
        };

        debug!(
            translator = self.translator.name(),
            source = %self.canonical_language,
            target = %target,
            chars = text.chars().count(),
            "Translating description"
        );

        self.translator
            .translate(text, &self.canonical_language, target)
            .await
    }
}

/// Primary language subtag ("ja" for "ja-JP", "zh" for "zh_Hant")
pub fn primary_subtag(language: &str) -> &str {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
}
