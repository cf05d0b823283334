//! Building catalog
//!
//! Read-only after construction, so it is shared between request tasks behind
//! an `Arc` without locking. Insertion order is preserved and is the
//! tie-break order used by the vision matcher.

use museum_common::{Building, Era, Error, Location, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// In-memory table of recognizable buildings
#[derive(Debug, Clone)]
pub struct BuildingCatalog {
    buildings: Vec<Building>,
    index: HashMap<String, usize>,
}

impl BuildingCatalog {
    /// Build a catalog, validating every record and id uniqueness
    pub fn new(buildings: Vec<Building>) -> Result<Self> {
        let mut index = HashMap::with_capacity(buildings.len());

        for (position, building) in buildings.iter().enumerate() {
            building.validate()?;
            if index.insert(building.id.clone(), position).is_some() {
                return Err(Error::Config(format!(
                    "duplicate building id '{}' in catalog",
                    building.id
                )));
            }
        }

        Ok(Self { buildings, index })
    }

    /// Load a catalog from a JSON array of buildings
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let buildings: Vec<Building> = serde_json::from_str(&content)?;
        let catalog = Self::new(buildings)?;
        info!(
            path = %path.display(),
            buildings = catalog.len(),
            "Loaded building catalog"
        );
        Ok(catalog)
    }

    /// Catalog shipped with the guide
    pub fn builtin() -> Self {
        Self::new(seed_buildings()).expect("built-in catalog satisfies invariants")
    }

    pub fn get(&self, id: &str) -> Option<&Building> {
        self.index.get(id).map(|&i| &self.buildings[i])
    }

    /// Buildings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// First building, used as the demo placeholder
    pub fn first(&self) -> Option<&Building> {
        self.buildings.first()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

fn seed_buildings() -> Vec<Building> {
    vec![
        Building {
            id: "meiji-main-hall".to_string(),
            name: "本館（明治記念館）".to_string(),
            era: Era::Meiji,
            year: 1889,
            description: "明治22年に建設された木造建築の傑作...".to_string(),
            images: vec![
                "/buildings/meiji-hall-1.jpg".to_string(),
                "/buildings/meiji-hall-2.jpg".to_string(),
            ],
            audio_guide: Some("/audio/meiji-hall-guide.mp3".to_string()),
            ai_description: None,
            location: Location {
                lat: 35.6762,
                lng: 139.6503,
            },
            features: vec![
                "木造建築".to_string(),
                "和洋折衷".to_string(),
                "国登録有形文化財".to_string(),
            ],
        },
        Building {
            id: "taisho-library".to_string(),
            name: "旧図書館（大正記念館）".to_string(),
            era: Era::Taisho,
            year: 1924,
            description: "大正13年に竣工した鉄筋コンクリート造の旧図書館。".to_string(),
            images: vec!["/buildings/taisho-library-1.jpg".to_string()],
            audio_guide: None,
            ai_description: None,
            location: Location {
                lat: 35.6768,
                lng: 139.6511,
            },
            features: vec![
                "鉄筋コンクリート造".to_string(),
                "ゴシック様式".to_string(),
            ],
        },
    ]
}
