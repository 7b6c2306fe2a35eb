use crate::SegmentId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

pub static FRANCE_ISO3: &str = "FRA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct ZoneId(i64);

/// Zone category as stored in the spatial store, decoded once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ZoneCategory {
    Amp,
    FishingCoastalWaters,
    ClippedTerritorialSeas,
    TerritorialSeas,
    Unclassified(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub category: ZoneCategory,
    pub sub_category: Option<String>,
    pub name: String,
    pub geometry: geo::Geometry<f64>,
    /// ISO3 codes of the countries with fishing rights in the zone.
    pub beneficiaries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentZone {
    pub segment_id: SegmentId,
    pub zone_id: ZoneId,
}

impl ZoneCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ZoneCategory::Amp => "amp",
            ZoneCategory::FishingCoastalWaters => "Fishing coastal waters (6-12 NM)",
            ZoneCategory::ClippedTerritorialSeas => "Clipped territorial seas",
            ZoneCategory::TerritorialSeas => "Territorial seas",
            ZoneCategory::Unclassified(v) => v,
        }
    }
}

impl From<String> for ZoneCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "amp" => ZoneCategory::Amp,
            "Fishing coastal waters (6-12 NM)" => ZoneCategory::FishingCoastalWaters,
            "Clipped territorial seas" => ZoneCategory::ClippedTerritorialSeas,
            "Territorial seas" => ZoneCategory::TerritorialSeas,
            _ => ZoneCategory::Unclassified(value),
        }
    }
}

impl From<&str> for ZoneCategory {
    fn from(value: &str) -> Self {
        ZoneCategory::from(value.to_string())
    }
}

impl Display for ZoneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Zone {
    /// Whether a vessel flagged under `country_iso3` may fish in this zone.
    /// Vessels without a known country are never beneficiaries.
    pub fn is_beneficiary(&self, country_iso3: Option<&str>) -> bool {
        country_iso3.is_some_and(|c| self.beneficiaries.iter().any(|b| b == c))
    }
}

impl ZoneId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
