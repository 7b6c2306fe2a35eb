use super::{from_seconds, point};
use crate::error::{Error, error::DataConversionSnafu};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use trawlwatch_core::{Arrival, Departure, ExcursionId, ExcursionTotals, PortId, VesselId};

#[derive(Debug, Clone, FromRow)]
pub struct Excursion {
    pub excursion_id: ExcursionId,
    pub vessel_id: VesselId,
    pub departure_port_id: Option<PortId>,
    pub departure_at: Option<DateTime<Utc>>,
    pub departure_latitude: Option<f64>,
    pub departure_longitude: Option<f64>,
    pub arrival_port_id: Option<PortId>,
    pub arrival_at: Option<DateTime<Utc>>,
    pub arrival_latitude: Option<f64>,
    pub arrival_longitude: Option<f64>,
    pub excursion_duration: f64,
    pub total_time_at_sea: f64,
    pub total_time_in_amp: f64,
    pub total_time_in_territorial_waters: f64,
    pub total_time_in_zones_with_no_fishing_rights: f64,
    pub total_time_fishing: f64,
    pub total_time_fishing_in_amp: f64,
    pub total_time_fishing_in_territorial_waters: f64,
    pub total_time_fishing_in_zones_with_no_fishing_rights: f64,
    pub total_time_default_ais: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Excursion> for trawlwatch_core::Excursion {
    type Error = Error;

    fn try_from(v: Excursion) -> Result<Self, Self::Error> {
        let arrival = match (
            v.arrival_port_id,
            v.arrival_at,
            point(v.arrival_latitude, v.arrival_longitude),
        ) {
            (Some(port_id), Some(timestamp), Some(position)) => Some(Arrival {
                port_id,
                timestamp,
                position,
            }),
            (None, None, None) => None,
            _ => {
                return DataConversionSnafu {
                    description: format!(
                        "excursion {} has a partially set arrival",
                        v.excursion_id
                    ),
                }
                .fail();
            }
        };

        Ok(Self {
            id: v.excursion_id,
            vessel_id: v.vessel_id,
            departure: Departure {
                port_id: v.departure_port_id,
                timestamp: v.departure_at,
                position: point(v.departure_latitude, v.departure_longitude),
            },
            arrival,
            totals: ExcursionTotals {
                excursion_duration: from_seconds(v.excursion_duration),
                total_time_at_sea: from_seconds(v.total_time_at_sea),
                total_time_in_amp: from_seconds(v.total_time_in_amp),
                total_time_in_territorial_waters: from_seconds(
                    v.total_time_in_territorial_waters,
                ),
                total_time_in_zones_with_no_fishing_rights: from_seconds(
                    v.total_time_in_zones_with_no_fishing_rights,
                ),
                total_time_fishing: from_seconds(v.total_time_fishing),
                total_time_fishing_in_amp: from_seconds(v.total_time_fishing_in_amp),
                total_time_fishing_in_territorial_waters: from_seconds(
                    v.total_time_fishing_in_territorial_waters,
                ),
                total_time_fishing_in_zones_with_no_fishing_rights: from_seconds(
                    v.total_time_fishing_in_zones_with_no_fishing_rights,
                ),
                total_time_default_ais: from_seconds(v.total_time_default_ais),
            },
            created_at: v.created_at,
            updated_at: v.updated_at,
        })
    }
}
