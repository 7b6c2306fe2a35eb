use crate::{SegmentId, VesselId, ZoneId};
use chrono::{DateTime, Duration, Utc};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Display)]
pub enum MetricsType {
    #[strum(serialize = "in_amp")]
    InAmp,
    #[strum(serialize = "in_zone_with_no_fishing_rights")]
    InZoneWithNoFishingRights,
    #[strum(serialize = "in_territorial_water")]
    InTerritorialWater,
    #[strum(serialize = "AT_SEA")]
    AtSea,
}

/// Append-only fact describing the time a vessel spent in a zone during one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMetrics {
    pub timestamp: DateTime<Utc>,
    pub vessel_id: VesselId,
    pub vessel_mmsi: Option<i32>,
    pub vessel_name: Option<String>,
    pub vessel_imo: Option<i32>,
    pub vessel_country_iso3: Option<String>,
    pub metrics_type: MetricsType,
    pub duration_total: Duration,
    pub duration_fishing: Option<Duration>,
    pub zone_id: ZoneId,
    pub zone_category: String,
    pub zone_sub_category: Option<String>,
    pub zone_name: String,
    pub segment_id: SegmentId,
}
