use crate::{ExcursionTotalsUpdate, NewMetrics, SegmentZone, SegmentZoneUpdate};

/// All writes produced by one aggregation run, committed together with the checkpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationBatch {
    /// Every processed segment, marks it as matched and stores its zone flags.
    pub segment_updates: Vec<SegmentZoneUpdate>,
    pub relations: Vec<SegmentZone>,
    pub metrics: Vec<NewMetrics>,
    pub excursions: Vec<ExcursionTotalsUpdate>,
}
