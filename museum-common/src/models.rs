//! Building catalog data model
//!
//! Buildings are authored once (built-in seed data or a JSON catalog file) and
//! never mutated after startup. JSON field names follow the catalog file
//! format (`audioGuide`, `aiDescription`).

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Earliest construction year accepted in the catalog
pub const MIN_PLAUSIBLE_YEAR: i32 = 1600;

/// Historical period a building belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Era {
    #[serde(rename = "明治", alias = "meiji", alias = "Meiji")]
    Meiji,
    #[serde(rename = "大正", alias = "taisho", alias = "Taisho")]
    Taisho,
}

impl Era {
    /// Canonical (Japanese) label, as written in the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Meiji => "明治",
            Era::Taisho => "大正",
        }
    }

    /// Gregorian years covered by the era (inclusive)
    pub fn years(&self) -> (i32, i32) {
        match self {
            Era::Meiji => (1868, 1912),
            Era::Taisho => (1912, 1926),
        }
    }
}

/// Geographic position of a building
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A recognizable campus building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    /// Unique catalog key
    pub id: String,
    pub name: String,
    pub era: Era,
    /// Construction year
    pub year: i32,
    /// Description in the canonical language
    pub description: String,
    /// Ordered image asset references
    #[serde(default)]
    pub images: Vec<String>,
    /// Pre-rendered narration asset (canonical language)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_guide: Option<String>,
    /// Extended description text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,
    pub location: Location,
    /// Descriptive tags, also used as recognition terms
    #[serde(default)]
    pub features: Vec<String>,
}

impl Building {
    /// Check per-record invariants
    ///
    /// The id must be non-empty, the year plausible and inside the era, and
    /// the coordinates in range.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "building '{}' has an empty id",
                self.name
            )));
        }

        let current_year = chrono::Utc::now().year();
        if self.year < MIN_PLAUSIBLE_YEAR || self.year > current_year {
            return Err(Error::InvalidInput(format!(
                "building '{}' has implausible year {} (expected {}..={})",
                self.id, self.year, MIN_PLAUSIBLE_YEAR, current_year
            )));
        }

        let (first, last) = self.era.years();
        if !(first..=last).contains(&self.year) {
            return Err(Error::InvalidInput(format!(
                "building '{}' year {} falls outside the {} era ({}..={})",
                self.id,
                self.year,
                self.era.as_str(),
                first,
                last
            )));
        }

        if !self.location.is_valid() {
            return Err(Error::InvalidInput(format!(
                "building '{}' has out-of-range location ({}, {})",
                self.id, self.location.lat, self.location.lng
            )));
        }

        Ok(())
    }
}
