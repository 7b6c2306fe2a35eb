use crate::{Point, PortId, SegmentType, VesselId, ZoneFlags};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct ExcursionId(i64);

#[derive(Debug, Clone, PartialEq)]
pub struct Excursion {
    pub id: ExcursionId,
    pub vessel_id: VesselId,
    pub departure: Departure,
    pub arrival: Option<Arrival>,
    pub totals: ExcursionTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Departure {
    pub port_id: Option<PortId>,
    pub timestamp: Option<DateTime<Utc>>,
    pub position: Option<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub port_id: PortId,
    pub timestamp: DateTime<Utc>,
    pub position: Point,
}

/// An excursion opened during a run, it might also be closed within the same run.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExcursion {
    pub vessel_id: VesselId,
    pub departure: Departure,
    pub arrival: Option<Arrival>,
}

/// Closes an already persisted excursion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcursionArrival {
    pub excursion_id: ExcursionId,
    pub arrival: Arrival,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcursionTotals {
    pub excursion_duration: Duration,
    pub total_time_at_sea: Duration,
    pub total_time_in_amp: Duration,
    pub total_time_in_territorial_waters: Duration,
    pub total_time_in_zones_with_no_fishing_rights: Duration,
    pub total_time_fishing: Duration,
    pub total_time_fishing_in_amp: Duration,
    pub total_time_fishing_in_territorial_waters: Duration,
    pub total_time_fishing_in_zones_with_no_fishing_rights: Duration,
    pub total_time_default_ais: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcursionTotalsUpdate {
    pub excursion_id: ExcursionId,
    pub totals: ExcursionTotals,
}

impl Default for ExcursionTotals {
    fn default() -> Self {
        Self {
            excursion_duration: Duration::zero(),
            total_time_at_sea: Duration::zero(),
            total_time_in_amp: Duration::zero(),
            total_time_in_territorial_waters: Duration::zero(),
            total_time_in_zones_with_no_fishing_rights: Duration::zero(),
            total_time_fishing: Duration::zero(),
            total_time_fishing_in_amp: Duration::zero(),
            total_time_fishing_in_territorial_waters: Duration::zero(),
            total_time_fishing_in_zones_with_no_fishing_rights: Duration::zero(),
            total_time_default_ais: Duration::zero(),
        }
    }
}

impl ExcursionTotals {
    /// Returns the totals after accounting for one classified segment.
    ///
    /// No fishing rights takes precedence over territorial waters so that at sea, territorial
    /// waters and no fishing rights partition `excursion_duration`.
    pub fn apply(
        mut self,
        duration: Duration,
        segment_type: SegmentType,
        flags: ZoneFlags,
    ) -> ExcursionTotals {
        let fishing = segment_type == SegmentType::Fishing;

        self.excursion_duration += duration;

        if flags.in_amp_zone {
            self.total_time_in_amp += duration;
            if fishing {
                self.total_time_fishing_in_amp += duration;
            }
        }

        if flags.in_zone_with_no_fishing_rights {
            self.total_time_in_zones_with_no_fishing_rights += duration;
            if fishing {
                self.total_time_fishing_in_zones_with_no_fishing_rights += duration;
            }
        } else if flags.in_territorial_waters {
            self.total_time_in_territorial_waters += duration;
            if fishing {
                self.total_time_fishing_in_territorial_waters += duration;
            }
        }

        match segment_type {
            SegmentType::Fishing => self.total_time_fishing += duration,
            SegmentType::DefaultAis => self.total_time_default_ais += duration,
            SegmentType::AtSea => (),
        }

        self.total_time_at_sea = self.excursion_duration
            - (self.total_time_in_zones_with_no_fishing_rights
                + self.total_time_in_territorial_waters);

        self
    }

    pub fn is_conserved(&self) -> bool {
        self.excursion_duration
            == self.total_time_at_sea
                + self.total_time_in_territorial_waters
                + self.total_time_in_zones_with_no_fishing_rights
    }
}

impl Excursion {
    pub fn is_open(&self) -> bool {
        self.arrival.is_none()
    }
}

impl NewExcursion {
    pub fn is_open(&self) -> bool {
        self.arrival.is_none()
    }
}

impl ExcursionId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl From<ExcursionId> for i64 {
    fn from(value: ExcursionId) -> Self {
        value.0
    }
}

impl Display for ExcursionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
