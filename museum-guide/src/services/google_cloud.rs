//! Shared plumbing for the Google Cloud REST clients
//!
//! Every client authenticates with an API key, sends the configured project
//! as the quota project, and paces itself with a `governor` rate limiter.
//! Without an API key the clients are disabled: each call reports
//! `ServiceUnavailable` without touching the network.

use crate::types::CapabilityError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("museum-guide/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const TRANSLATE_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";
pub const TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Credentials and pacing shared by the Google clients
#[derive(Debug, Clone)]
pub struct GoogleCloudSettings {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    /// Outbound requests per second, per client
    pub requests_per_second: u32,
}

impl GoogleCloudSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

type DirectRateLimiter = governor::RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Rate-limited JSON POST client for one Google API endpoint
pub(crate) struct GoogleApi {
    service: &'static str,
    endpoint: String,
    http_client: reqwest::Client,
    rate_limiter: DirectRateLimiter,
    settings: GoogleCloudSettings,
    /// HTTP 400 means the submitted image was rejected
    image_payload: bool,
}

impl GoogleApi {
    pub(crate) fn new(
        service: &'static str,
        endpoint: impl Into<String>,
        settings: GoogleCloudSettings,
    ) -> Result<Self, CapabilityError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                CapabilityError::ServiceUnavailable(format!("HTTP client init failed: {}", e))
            })?;

        let per_second = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = governor::RateLimiter::direct(governor::Quota::per_second(per_second));

        if !settings.is_configured() {
            warn!(service, "No Google Cloud API key configured, {} calls disabled", service);
        }

        Ok(Self {
            service,
            endpoint: endpoint.into(),
            http_client,
            rate_limiter,
            settings,
            image_payload: false,
        })
    }

    /// Treat HTTP 400 responses as `InvalidImage`
    pub(crate) fn with_image_payload(mut self) -> Self {
        self.image_payload = true;
        self
    }

    pub(crate) fn service(&self) -> &'static str {
        self.service
    }

    /// POST `body` as JSON and decode the JSON response
    pub(crate) async fn post_json<B, R>(&self, body: &B) -> Result<R, CapabilityError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let api_key = match self.settings.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(CapabilityError::ServiceUnavailable(format!(
                    "{} disabled: no API key configured",
                    self.service
                )))
            }
        };

        self.rate_limiter.until_ready().await;

        debug!(service = self.service, endpoint = %self.endpoint, "Calling Google Cloud API");

        let mut request = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(body);
        if let Some(project) = &self.settings.project_id {
            request = request.header("x-goog-user-project", project);
        }

        let response = request.send().await.map_err(|e| {
            CapabilityError::ServiceUnavailable(format!("{} request failed: {}", self.service, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(self.service, status.as_u16(), &body, self.image_payload));
        }

        response.json::<R>().await.map_err(|e| {
            CapabilityError::ServiceUnavailable(format!(
                "{} response parse failed: {}",
                self.service, e
            ))
        })
    }
}

/// Map a non-success HTTP status to a capability error
///
/// 429 is upstream quota exhaustion; 400 on an image call means the image
/// was rejected. Everything else is treated as the service being unavailable.
pub(crate) fn map_status(
    service: &str,
    status: u16,
    body: &str,
    image_payload: bool,
) -> CapabilityError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        429 => CapabilityError::QuotaExceededUpstream,
        400 if image_payload => {
            CapabilityError::InvalidImage(format!("{} rejected image: {}", service, snippet))
        }
        _ => CapabilityError::ServiceUnavailable(format!(
            "{} returned HTTP {}: {}",
            service, status, snippet
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> GoogleCloudSettings {
        GoogleCloudSettings {
            api_key: api_key.map(str::to_string),
            project_id: Some("museum-project".to_string()),
            requests_per_second: 0,
        }
    }

    #[test]
    fn test_is_configured() {
        assert!(settings(Some("abc")).is_configured());
        assert!(!settings(Some("   ")).is_configured());
        assert!(!settings(None).is_configured());
    }

    #[test]
    fn test_map_status() {
        assert_eq!(
            map_status("vision", 429, "", true),
            CapabilityError::QuotaExceededUpstream
        );
        assert!(matches!(
            map_status("vision", 400, "bad image", true),
            CapabilityError::InvalidImage(_)
        ));
        assert!(matches!(
            map_status("translate", 400, "bad target", false),
            CapabilityError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            map_status("vision", 503, "down", true),
            CapabilityError::ServiceUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_disabled_without_api_key() {
        let api = GoogleApi::new("vision", VISION_ENDPOINT, settings(None)).unwrap();
        let result: Result<serde_json::Value, _> = api.post_json(&serde_json::json!({})).await;
        assert!(matches!(result, Err(CapabilityError::ServiceUnavailable(_))));
    }
}
