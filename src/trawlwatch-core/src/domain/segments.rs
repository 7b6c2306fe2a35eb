use crate::{ExcursionId, Point, VesselId, VesselSnapshot};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct SegmentId(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Display)]
pub enum SegmentType {
    #[strum(serialize = "AT_SEA")]
    AtSea,
    /// The reporting gap was long enough that the travelled path is unknown.
    #[strum(serialize = "DEFAULT_AIS")]
    DefaultAis,
    #[strum(serialize = "FISHING")]
    Fishing,
}

/// Which excursion a segment belongs to before it is persisted.
///
/// Excursions opened during a run are only assigned ids at commit, `New` indexes into the
/// vessel's list of new excursions for that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExcursionRef {
    Existing(ExcursionId),
    New(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub vessel_id: VesselId,
    pub excursion_id: ExcursionId,
    pub timestamp_start: DateTime<Utc>,
    pub timestamp_end: DateTime<Utc>,
    pub start_position: Point,
    pub end_position: Point,
    pub distance: f64,
    pub duration: Duration,
    pub average_speed: f64,
    pub segment_type: SegmentType,
    pub in_amp_zone: bool,
    pub in_territorial_waters: bool,
    pub in_zone_with_no_fishing_rights: bool,
    pub last_vessel_segment: bool,
    pub zones_matched: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSegment {
    pub vessel_id: VesselId,
    pub excursion: ExcursionRef,
    pub timestamp_start: DateTime<Utc>,
    pub timestamp_end: DateTime<Utc>,
    pub start_position: Point,
    pub end_position: Point,
    pub distance: f64,
    pub duration: Duration,
    pub average_speed: f64,
    pub segment_type: SegmentType,
    pub last_vessel_segment: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentWithVessel {
    pub segment: Segment,
    pub vessel: VesselSnapshot,
}

/// Zone membership flags resolved for a single segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneFlags {
    pub in_amp_zone: bool,
    pub in_territorial_waters: bool,
    pub in_zone_with_no_fishing_rights: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentZoneUpdate {
    pub segment_id: SegmentId,
    pub flags: ZoneFlags,
}

impl Segment {
    /// The most recent modification of the segment, drives the aggregation watermark.
    pub fn modified_at(&self) -> DateTime<Utc> {
        self.created_at.max(self.updated_at)
    }
}

impl ZoneFlags {
    pub fn merge(self, other: ZoneFlags) -> ZoneFlags {
        ZoneFlags {
            in_amp_zone: self.in_amp_zone || other.in_amp_zone,
            in_territorial_waters: self.in_territorial_waters || other.in_territorial_waters,
            in_zone_with_no_fishing_rights: self.in_zone_with_no_fishing_rights
                || other.in_zone_with_no_fishing_rights,
        }
    }
}

impl SegmentId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
