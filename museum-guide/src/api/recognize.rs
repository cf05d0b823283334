//! Recognition endpoint
//!
//! `POST /api/recognize?lang=<code>` with the raw image as the request body.

use crate::types::{Narration, RecognitionRequest, RecognitionResult};
use crate::{ApiResult, AppState};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use base64::Engine;
use museum_common::Building;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use tracing::debug;
use uuid::Uuid;

/// Caller id used when the peer address is unknown
pub const ANONYMOUS_CALLER: &str = "anonymous";

#[derive(Debug, Deserialize)]
pub struct RecognizeQuery {
    /// Requested description language; canonical when absent
    pub lang: Option<String>,
}

/// Narration in a JSON response
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioPayload {
    /// Precomputed asset served separately
    Asset { url: String },
    /// Synthesized audio, base64-encoded
    Inline { mime_type: String, data: String },
}

impl From<Narration> for AudioPayload {
    fn from(narration: Narration) -> Self {
        match narration {
            Narration::Asset(url) => AudioPayload::Asset { url },
            Narration::Inline(clip) => AudioPayload::Inline {
                mime_type: clip.mime_type,
                data: base64::engine::general_purpose::STANDARD.encode(clip.bytes),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecognizeResponse {
    pub request_id: Uuid,
    pub matched: bool,
    pub building: Option<Building>,
    pub confidence: f32,
    pub description: Option<String>,
    pub language: String,
    pub audio: Option<AudioPayload>,
    pub demo_fallback: bool,
}

impl From<RecognitionResult> for RecognizeResponse {
    fn from(result: RecognitionResult) -> Self {
        Self {
            request_id: result.request_id,
            matched: result.is_match(),
            building: result.building,
            confidence: result.confidence,
            description: result.description,
            language: result.language,
            audio: result.audio.map(AudioPayload::from),
            demo_fallback: result.demo_fallback,
        }
    }
}

/// POST /api/recognize
///
/// **Errors:**
/// - 400 Bad Request: empty or unrecognised image payload
/// - 403 Forbidden: caller not on the allow-list
/// - 429 Too Many Requests: per-caller or global quota exhausted
/// - 503 Service Unavailable: vision capability failed (demo mode off)
pub async fn recognize(
    State(state): State<AppState>,
    Query(query): Query<RecognizeQuery>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<RecognizeResponse>> {
    let caller_id = caller_identity(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        &state.trusted_proxies,
    );
    debug!(caller = %caller_id, bytes = body.len(), "Recognition request received");

    let mut request = RecognitionRequest::new(body.to_vec(), caller_id);
    if let Some(lang) = query.lang.filter(|l| !l.trim().is_empty()) {
        request = request.with_language(lang);
    }

    let result = state.orchestrator.recognize(request).await?;
    Ok(Json(result.into()))
}

/// Caller identity for quota accounting
///
/// The peer IP, unless the peer is a trusted proxy: then the nearest
/// `X-Forwarded-For` hop that is not itself a trusted proxy. Without a peer
/// address the caller is `anonymous` and forwarded headers are ignored.
pub fn caller_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: &[IpAddr],
) -> String {
    let Some(peer) = peer else {
        return ANONYMOUS_CALLER.to_string();
    };
    let peer_ip = peer.ip();
    if !trusted_proxies.contains(&peer_ip) {
        return peer_ip.to_string();
    }

    // Proxies append on the right, so walk the chain right to left
    let hops: Vec<IpAddr> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .collect();

    hops.iter()
        .rev()
        .find(|ip| !trusted_proxies.contains(*ip))
        .or(hops.first())
        .copied()
        .unwrap_or(peer_ip)
        .to_string()
}

/// Build recognition routes
pub fn recognize_routes() -> Router<AppState> {
    Router::new().route("/api/recognize", post(recognize))
}
