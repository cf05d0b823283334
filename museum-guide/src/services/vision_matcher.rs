//! Vision Matcher
//!
//! Sends an image to the label detection capability and turns the raw
//! detections into ranked catalog candidates.
//!
//! # Scoring
//! Each detection label is compared with every recognition term of a
//! building (`id`, `name`, each of `features`), case-insensitively:
//! - equal, or the label contains the term → overlap 1.0
//! - the term contains the label → character ratio `len(label) / len(term)`
//! - otherwise token overlap `(m/|label| + m/|term|) / 2`, where `m` counts
//!   label tokens equal to, or within normalized Levenshtein 0.85 of, a term token.
//!   Token overlap is zero unless the label covers at least half the term's
//!   tokens, so one generic word ("hall") cannot carry a multi-word term.
//!
//! A building scores `max(confidence × overlap)` over the detections, plus
//! 0.1 × the sum of the remaining matching detections, clamped to 1.0.
//! Ties keep catalog insertion order.

use crate::catalog::BuildingCatalog;
use crate::types::{CapabilityError, Detection, LabelDetector};
use museum_common::Building;
use std::sync::Arc;
use tracing::{debug, info};

/// Token similarity needed for a fuzzy token match
const FUZZY_TOKEN_THRESHOLD: f64 = 0.85;

/// Weight of corroborating detections beyond the best one
const CORROBORATION_WEIGHT: f32 = 0.1;

/// Shortest string (in chars) that may satisfy a containment match
const MIN_CONTAINMENT_CHARS: usize = 2;

/// Share of a term's tokens a label must cover before token overlap counts
const MIN_TERM_COVERAGE: f32 = 0.5;

/// Ranked catalog candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub building_id: String,
    /// Combined score (0.0-1.0)
    pub score: f32,
    /// Detection label that contributed the best overlap
    pub matched_label: String,
}

/// Outcome of matching detections against the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(Candidate),
    /// No candidate reached the threshold; carries the best score seen
    NoMatch { best_score: f32 },
}

/// Label detection plus catalog matching
pub struct VisionMatcher {
    detector: Arc<dyn LabelDetector>,
    min_score: f32,
}

impl VisionMatcher {
    pub fn new(detector: Arc<dyn LabelDetector>, min_score: f32) -> Self {
        Self {
            detector,
            min_score: min_score.clamp(0.0, 1.0),
        }
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    /// Detect labels in `image`
    ///
    /// Payloads that are empty or not a recognised image format fail with
    /// `InvalidImage` without reaching the upstream service.
    pub async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>, CapabilityError> {
        if image.is_empty() {
            return Err(CapabilityError::InvalidImage("empty image payload".to_string()));
        }
        if !infer::is_image(image) {
            let kind = infer::get(image)
                .map(|t| t.mime_type())
                .unwrap_or("unknown");
            return Err(CapabilityError::InvalidImage(format!(
                "payload is not an image (detected: {})",
                kind
            )));
        }

        let detections = self.detector.detect(image).await?;
        debug!(
            detector = self.detector.name(),
            count = detections.len(),
            "Label detection complete"
        );
        Ok(detections)
    }

    /// Rank every building with a non-zero score, best first
    pub fn rank(&self, catalog: &BuildingCatalog, detections: &[Detection]) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = catalog
            .iter()
            .filter_map(|building| score_building(building, detections))
            .collect();

        // Stable sort: equal scores keep catalog insertion order.
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    /// Best candidate if it reaches the threshold
    pub fn best_match(&self, catalog: &BuildingCatalog, detections: &[Detection]) -> MatchOutcome {
        let ranked = self.rank(catalog, detections);

        match ranked.into_iter().next() {
            Some(top) if top.score >= self.min_score => {
                info!(
                    building_id = %top.building_id,
                    score = top.score,
                    label = %top.matched_label,
                    "Building matched"
                );
                MatchOutcome::Matched(top)
            }
            Some(top) => {
                debug!(
                    building_id = %top.building_id,
                    score = top.score,
                    threshold = self.min_score,
                    "Best candidate below threshold"
                );
                MatchOutcome::NoMatch {
                    best_score: top.score,
                }
            }
            None => MatchOutcome::NoMatch { best_score: 0.0 },
        }
    }
}

fn score_building(building: &Building, detections: &[Detection]) -> Option<Candidate> {
    let terms: Vec<Normalized> = std::iter::once(building.id.as_str())
        .chain(std::iter::once(building.name.as_str()))
        .chain(building.features.iter().map(String::as_str))
        .map(Normalized::new)
        .filter(|t| !t.tokens.is_empty())
        .collect();

    let mut contributions: Vec<(f32, &str)> = detections
        .iter()
        .filter_map(|d| {
            let label = Normalized::new(&d.label);
            let overlap = terms
                .iter()
                .map(|term| term_overlap(&label, term))
                .fold(0.0f32, f32::max);
            let weighted = d.confidence * overlap;
            (weighted > 0.0).then_some((weighted, d.label.as_str()))
        })
        .collect();

    if contributions.is_empty() {
        return None;
    }

    contributions.sort_by(|a, b| b.0.total_cmp(&a.0));
    let (primary, label) = contributions[0];
    let corroboration: f32 = contributions[1..].iter().map(|(w, _)| w).sum();
    let score = (primary + CORROBORATION_WEIGHT * corroboration).min(1.0);

    Some(Candidate {
        building_id: building.id.clone(),
        score,
        matched_label: label.to_string(),
    })
}

/// Lowercased text split on non-alphanumeric characters
struct Normalized {
    joined: String,
    tokens: Vec<String>,
}

impl Normalized {
    fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let tokens: Vec<String> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let joined = tokens.join(" ");
        Self { joined, tokens }
    }

    fn char_len(&self) -> usize {
        self.joined.chars().count()
    }
}

fn term_overlap(label: &Normalized, term: &Normalized) -> f32 {
    if label.tokens.is_empty() || term.tokens.is_empty() {
        return 0.0;
    }
    if label.joined == term.joined {
        return 1.0;
    }

    let label_len = label.char_len();
    let term_len = term.char_len();

    if term_len >= MIN_CONTAINMENT_CHARS && label.joined.contains(&term.joined) {
        return 1.0;
    }

    let containment = if label_len >= MIN_CONTAINMENT_CHARS && term.joined.contains(&label.joined)
    {
        label_len as f32 / term_len as f32
    } else {
        0.0
    };

    let matched = label
        .tokens
        .iter()
        .filter(|lt| term.tokens.iter().any(|tt| tokens_match(lt, tt)))
        .count();
    let m = matched as f32;
    let term_coverage = (m / term.tokens.len() as f32).min(1.0);
    let token_score = if matched == 0 || term_coverage < MIN_TERM_COVERAGE {
        0.0
    } else {
        (m / label.tokens.len() as f32 + term_coverage) / 2.0
    };

    containment.max(token_score)
}

fn tokens_match(a: &str, b: &str) -> bool {
    a == b || strsim::normalized_levenshtein(a, b) >= FUZZY_TOKEN_THRESHOLD
}
