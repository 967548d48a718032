//! Zone catalog: the known place names, read-only from the pipeline's side.
//!
//! This module provides:
//! - The `Zone` record and the `ZoneCatalog` source trait
//! - Nearest-name matching for recognised text (`matcher`)
//! - Type-ahead search over zone names (`search`)

pub mod matcher;
pub mod search;

pub use matcher::{closest, match_zone, ZoneMatch};
pub use search::{filter_zones, get_max_string};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A zone as served by the mapping backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub tier: String,
    /// Color classification (black, red, yellow, blue, road...)
    #[serde(default)]
    pub color: String,
    #[serde(default, rename = "type")]
    pub zone_type: String,
}

impl Zone {
    /// Name as used for matching.
    pub fn display_name(&self) -> &str {
        self.name.trim()
    }
}

/// Finds a zone by exact display name, or the default zone.
pub fn find_zone_or_default(zones: &[Zone], name: &str) -> Zone {
    zones
        .iter()
        .find(|z| z.display_name() == name)
        .cloned()
        .unwrap_or_default()
}

/// Source of the zone list. Ordering is preserved as provided.
pub trait ZoneCatalog {
    fn list(&self) -> Result<Vec<Zone>>;
}

/// A catalog held in memory.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    zones: Vec<Zone>,
}

impl StaticCatalog {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }
}

impl ZoneCatalog for StaticCatalog {
    fn list(&self) -> Result<Vec<Zone>> {
        Ok(self.zones.clone())
    }
}

/// A catalog stored as a JSON array of zones.
#[derive(Clone, Debug)]
pub struct JsonZoneCatalog {
    path: PathBuf,
}

impl JsonZoneCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ZoneCatalog for JsonZoneCatalog {
    fn list(&self) -> Result<Vec<Zone>> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read zone catalog {}", self.path.display()))?;
        let zones: Vec<Zone> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse zone catalog {}", self.path.display()))?;
        crate::log(&format!(
            "Loaded {} zones from {}",
            zones.len(),
            self.path.display()
        ));
        Ok(zones)
    }
}

#[cfg(test)]
pub(crate) fn zone(name: &str) -> Zone {
    Zone {
        id: 0,
        name: name.to_string(),
        tier: "tier".to_string(),
        color: "black".to_string(),
        zone_type: String::new(),
    }
}
