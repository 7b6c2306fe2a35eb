//! Classifies segments against the zones they cross and folds them into metrics and excursion
//! totals.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use trawlwatch_core::{
    AggregationBatch, Error, Excursion, ExcursionId, ExcursionTotals, ExcursionTotalsUpdate,
    FRANCE_ISO3, MetricsType, NewMetrics, SegmentType, SegmentWithVessel, SegmentZone,
    SegmentZoneUpdate, Zone, ZoneCategory, ZoneFlags,
};

/// How a single zone affects a segment of a given vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneClassification {
    pub flags: ZoneFlags,
    pub metrics_type: MetricsType,
}

/// A segment together with the zones it intersects, `DEFAULT_AIS` segments are never looked up
/// and carry no zones.
#[derive(Debug, Clone)]
pub struct SegmentZones {
    pub segment: SegmentWithVessel,
    pub zones: Vec<Zone>,
}

pub fn classify(zone: &Zone, country_iso3: Option<&str>) -> ZoneClassification {
    let mut flags = ZoneFlags::default();
    let metrics_type = match &zone.category {
        ZoneCategory::Amp => {
            flags.in_amp_zone = true;
            MetricsType::InAmp
        }
        ZoneCategory::FishingCoastalWaters => {
            flags.in_zone_with_no_fishing_rights = !zone.is_beneficiary(country_iso3);
            MetricsType::InZoneWithNoFishingRights
        }
        ZoneCategory::ClippedTerritorialSeas => {
            flags.in_zone_with_no_fishing_rights = country_iso3 != Some(FRANCE_ISO3);
            MetricsType::InZoneWithNoFishingRights
        }
        ZoneCategory::TerritorialSeas => {
            flags.in_territorial_waters = true;
            MetricsType::InTerritorialWater
        }
        ZoneCategory::Unclassified(_) => MetricsType::AtSea,
    };

    ZoneClassification {
        flags,
        metrics_type,
    }
}

/// Folds classified segments into an `AggregationBatch`, adding to the current totals of
/// `excursions`.
///
/// Returns the batch and the most recent modification time among the segments. A segment whose
/// excursion is not among `excursions` is a data inconsistency.
pub fn aggregate(
    segments: Vec<SegmentZones>,
    excursions: Vec<Excursion>,
) -> Result<(AggregationBatch, Option<DateTime<Utc>>)> {
    let mut totals: HashMap<ExcursionId, ExcursionTotals> =
        excursions.into_iter().map(|e| (e.id, e.totals)).collect();
    let mut touched: Vec<ExcursionId> = Vec::new();
    let mut batch = AggregationBatch::default();
    let mut watermark: Option<DateTime<Utc>> = None;

    for SegmentZones { segment, zones } in segments {
        let SegmentWithVessel { segment, vessel } = segment;
        let country = vessel.country_iso3.as_deref();

        let mut flags = ZoneFlags::default();
        for zone in &zones {
            let classification = classify(zone, country);
            flags = flags.merge(classification.flags);

            batch.relations.push(SegmentZone {
                segment_id: segment.id,
                zone_id: zone.id,
            });
            batch.metrics.push(NewMetrics {
                timestamp: segment.timestamp_start,
                vessel_id: vessel.id,
                vessel_mmsi: vessel.mmsi,
                vessel_name: vessel.name.clone(),
                vessel_imo: vessel.imo,
                vessel_country_iso3: vessel.country_iso3.clone(),
                metrics_type: classification.metrics_type,
                duration_total: segment.duration,
                duration_fishing: (segment.segment_type == SegmentType::Fishing)
                    .then_some(segment.duration),
                zone_id: zone.id,
                zone_category: zone.category.to_string(),
                zone_sub_category: zone.sub_category.clone(),
                zone_name: zone.name.clone(),
                segment_id: segment.id,
            });
        }

        let excursion_totals = totals.get_mut(&segment.excursion_id).ok_or_else(|| {
            Error::inconsistency(format!(
                "segment {} references missing excursion {}",
                segment.id, segment.excursion_id
            ))
        })?;
        *excursion_totals = excursion_totals.apply(segment.duration, segment.segment_type, flags);
        if !touched.contains(&segment.excursion_id) {
            touched.push(segment.excursion_id);
        }

        batch.segment_updates.push(SegmentZoneUpdate {
            segment_id: segment.id,
            flags,
        });

        let modified_at = segment.modified_at();
        watermark = Some(watermark.map_or(modified_at, |w| w.max(modified_at)));
    }

    batch.excursions = touched
        .into_iter()
        .filter_map(|id| {
            totals.get(&id).map(|t| ExcursionTotalsUpdate {
                excursion_id: id,
                totals: *t,
            })
        })
        .collect();

    Ok((batch, watermark))
}
