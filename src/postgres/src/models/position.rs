use chrono::{DateTime, Utc};
use sqlx::FromRow;
use trawlwatch_core::VesselId;

#[derive(Debug, Clone, FromRow)]
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
    pub created_at: DateTime<Utc>,
}

impl From<Position> for trawlwatch_core::Position {
    fn from(v: Position) -> Self {
        Self {
            vessel_id: v.vessel_id,
            timestamp: v.timestamp,
            latitude: v.latitude,
            longitude: v.longitude,
            speed: v.speed,
            heading: v.heading,
            course: v.course,
            accuracy: v.accuracy,
            collection_type: v.collection_type,
            created_at: v.created_at,
        }
    }
}
