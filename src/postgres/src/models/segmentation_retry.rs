use chrono::{DateTime, Utc};
use sqlx::FromRow;
use trawlwatch_core::VesselId;

#[derive(Debug, Clone, FromRow)]
pub struct SegmentationRetry {
    pub vessel_id: VesselId,
    pub resume_from: DateTime<Utc>,
}

impl From<SegmentationRetry> for trawlwatch_core::SegmentationRetry {
    fn from(v: SegmentationRetry) -> Self {
        Self {
            vessel_id: v.vessel_id,
            resume_from: v.resume_from,
        }
    }
}
