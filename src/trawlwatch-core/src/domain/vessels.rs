use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct VesselId(i64);

/// Vessel attributes copied into metrics rows at the time a segment is classified.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselSnapshot {
    pub id: VesselId,
    pub mmsi: Option<i32>,
    pub name: Option<String>,
    pub imo: Option<i32>,
    pub country_iso3: Option<String>,
}

impl VesselId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl From<VesselId> for i64 {
    fn from(value: VesselId) -> Self {
        value.0
    }
}

impl Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
