//! Observation sites (named points with a fixed location).

use serde::{Deserialize, Serialize};

/// Unique identifier for a site (e.g. an ICAO code such as "NZWN").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SiteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for SiteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Exposure class of a site, used by the synthetic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteCategory {
    #[default]
    Inland,
    Airport,
    Coastal,
}

impl SiteCategory {
    /// Infer a category from a site name when none is configured.
    pub fn from_name(name: &str) -> Self {
        if name.contains("Airport") {
            SiteCategory::Airport
        } else if name.contains("Kapiti") || name.contains("Castlepoint") {
            SiteCategory::Coastal
        } else {
            SiteCategory::Inland
        }
    }

    /// Speed offset (km/h) applied to generated readings.
    pub fn speed_bonus(&self) -> f64 {
        match self {
            SiteCategory::Inland => 0.0,
            SiteCategory::Airport => 5.0,
            SiteCategory::Coastal => 8.0,
        }
    }
}

/// A named observation site. Loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub category: Option<SiteCategory>,
}

impl Site {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: SiteId::new(id),
            name: name.into(),
            lat,
            lon,
            category: None,
        }
    }

    pub fn with_category(mut self, category: SiteCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Configured category, falling back to the name heuristic.
    pub fn category(&self) -> SiteCategory {
        self.category
            .unwrap_or_else(|| SiteCategory::from_name(&self.name))
    }

    /// Key used for the durable historical cache.
    pub fn historical_cache_key(&self) -> String {
        format!("historical_{}", self.name)
    }
}
