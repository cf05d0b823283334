//! Google Cloud Vision client
//!
//! Requests landmark and label detection for one image and flattens both
//! annotation lists into detections, landmarks first.

use crate::services::google_cloud::{GoogleApi, GoogleCloudSettings, VISION_ENDPOINT};
use crate::types::{CapabilityError, Detection, LabelDetector};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

const MAX_LANDMARKS: u32 = 10;
const MAX_LABELS: u32 = 20;

/// google.rpc.Code values reported per image
const RPC_INVALID_ARGUMENT: i32 = 3;
const RPC_RESOURCE_EXHAUSTED: i32 = 8;

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    landmark_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Vision API label/landmark detector
pub struct GoogleVisionClient {
    api: GoogleApi,
}

impl GoogleVisionClient {
    pub fn new(settings: GoogleCloudSettings) -> Result<Self, CapabilityError> {
        Ok(Self {
            api: GoogleApi::new("vision", VISION_ENDPOINT, settings)?.with_image_payload(),
        })
    }
}

#[async_trait::async_trait]
impl LabelDetector for GoogleVisionClient {
    fn name(&self) -> &'static str {
        self.api.service()
    }

    async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>, CapabilityError> {
        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: vec![
                    Feature {
                        kind: "LANDMARK_DETECTION",
                        max_results: MAX_LANDMARKS,
                    },
                    Feature {
                        kind: "LABEL_DETECTION",
                        max_results: MAX_LABELS,
                    },
                ],
            }],
        };

        let response: AnnotateResponse = self.api.post_json(&request).await?;
        let detections = detections_from_response(response)?;

        if let Some(top) = detections.first() {
            info!(
                label = %top.label,
                confidence = top.confidence,
                total = detections.len(),
                "Vision detection successful"
            );
        }
        Ok(detections)
    }
}

/// Flatten an annotate response into detections (landmarks, then labels)
pub(crate) fn detections_from_response(
    response: AnnotateResponse,
) -> Result<Vec<Detection>, CapabilityError> {
    let Some(image) = response.responses.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(err) = image.error {
        return Err(match err.code {
            RPC_INVALID_ARGUMENT => CapabilityError::InvalidImage(err.message),
            RPC_RESOURCE_EXHAUSTED => CapabilityError::QuotaExceededUpstream,
            _ => CapabilityError::ServiceUnavailable(format!(
                "vision error {}: {}",
                err.code, err.message
            )),
        });
    }

    Ok(image
        .landmark_annotations
        .into_iter()
        .chain(image.label_annotations)
        .filter(|a| !a.description.trim().is_empty())
        .map(|a| Detection::new(a.description, a.score))
        .collect())
}
