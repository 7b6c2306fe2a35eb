use super::from_seconds;
use crate::error::{Error, error::DataConversionSnafu};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use trawlwatch_core::{ExcursionId, Point, SegmentId, SegmentType, VesselId, VesselSnapshot};

#[derive(Debug, Clone, FromRow)]
pub struct Segment {
    pub segment_id: SegmentId,
    pub vessel_id: VesselId,
    pub excursion_id: ExcursionId,
    pub timestamp_start: DateTime<Utc>,
    pub timestamp_end: DateTime<Utc>,
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_latitude: f64,
    pub end_longitude: f64,
    pub distance: f64,
    pub duration: f64,
    pub average_speed: f64,
    pub segment_type: String,
    pub in_amp_zone: bool,
    pub in_territorial_waters: bool,
    pub in_zone_with_no_fishing_rights: bool,
    pub last_vessel_segment: bool,
    pub zones_matched: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SegmentWithVessel {
    #[sqlx(flatten)]
    pub segment: Segment,
    pub vessel_mmsi: Option<i32>,
    pub vessel_name: Option<String>,
    pub vessel_imo: Option<i32>,
    pub vessel_country_iso3: Option<String>,
}

impl TryFrom<Segment> for trawlwatch_core::Segment {
    type Error = Error;

    fn try_from(v: Segment) -> Result<Self, Self::Error> {
        let segment_type = SegmentType::from_str(&v.segment_type).map_err(|_| {
            DataConversionSnafu {
                description: format!("unknown segment type '{}'", v.segment_type),
            }
            .build()
        })?;

        Ok(Self {
            id: v.segment_id,
            vessel_id: v.vessel_id,
            excursion_id: v.excursion_id,
            timestamp_start: v.timestamp_start,
            timestamp_end: v.timestamp_end,
            start_position: Point::new(v.start_latitude, v.start_longitude),
            end_position: Point::new(v.end_latitude, v.end_longitude),
            distance: v.distance,
            duration: from_seconds(v.duration),
            average_speed: v.average_speed,
            segment_type,
            in_amp_zone: v.in_amp_zone,
            in_territorial_waters: v.in_territorial_waters,
            in_zone_with_no_fishing_rights: v.in_zone_with_no_fishing_rights,
            last_vessel_segment: v.last_vessel_segment,
            zones_matched: v.zones_matched,
            created_at: v.created_at,
            updated_at: v.updated_at,
        })
    }
}

impl TryFrom<SegmentWithVessel> for trawlwatch_core::SegmentWithVessel {
    type Error = Error;

    fn try_from(v: SegmentWithVessel) -> Result<Self, Self::Error> {
        let segment = trawlwatch_core::Segment::try_from(v.segment)?;
        Ok(Self {
            vessel: VesselSnapshot {
                id: segment.vessel_id,
                mmsi: v.vessel_mmsi,
                name: v.vessel_name,
                imo: v.vessel_imo,
                country_iso3: v.vessel_country_iso3,
            },
            segment,
        })
    }
}
