use crate::VesselId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single AIS position report as delivered by the ingestion side.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub vessel_id: VesselId,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub course: Option<f64>,
    pub accuracy: Option<String>,
    pub collection_type: Option<String>,
    /// When the position was stored, incremental batches are bounded on this value.
    pub created_at: DateTime<Utc>,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Point {
        Point {
            latitude,
            longitude,
        }
    }
}

impl Position {
    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

impl From<&Position> for Point {
    fn from(value: &Position) -> Self {
        value.point()
    }
}

impl From<&Point> for geo::Coord<f64> {
    fn from(value: &Point) -> Self {
        geo::coord! { x: value.longitude, y: value.latitude }
    }
}
