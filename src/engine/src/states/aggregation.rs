use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use itertools::Itertools;
use tracing::{info, instrument};
use trawlwatch_core::{CheckpointAdvance, ExcursionId, SegmentType, TaskName, retry_with_timeout};

use crate::{error::Result, *};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub num_segments: u32,
    pub num_zone_lookups: u32,
    pub num_relations: u32,
    pub num_metrics: u32,
    pub num_excursions: u32,
    pub watermark: Option<DateTime<Utc>>,
}

#[instrument(skip_all)]
pub async fn run_aggregation(
    shared_state: &SharedState,
    progress: &mut StageProgress,
) -> Result<AggregationReport> {
    let started = Utc::now();
    let task_name = TaskName::ClassifyAndAggregate;
    let settings = &shared_state.settings;

    let watermark = shared_state
        .checkpoint_store
        .get_watermark(task_name)
        .await?;
    progress.watermark = Some(watermark);

    let segments = shared_state
        .aggregation_outbound
        .unmatched_segments(watermark, settings.aggregation_batch_size)
        .await?;

    if segments.is_empty() {
        return Ok(AggregationReport::default());
    }

    let mut report = AggregationReport {
        num_segments: segments.len() as u32,
        num_zone_lookups: segments
            .iter()
            .filter(|s| s.segment.segment_type != SegmentType::DefaultAis)
            .count() as u32,
        ..Default::default()
    };

    let spatial_store = shared_state.spatial_store.as_ref();
    let timeout = settings.spatial_timeout;

    let segments: Vec<SegmentZones> = futures::stream::iter(segments)
        .map(|segment| async move {
            let zones = match segment.segment.segment_type {
                SegmentType::DefaultAis => vec![],
                SegmentType::AtSea | SegmentType::Fishing => {
                    let (start, end) = (segment.segment.start_position, segment.segment.end_position);
                    retry_with_timeout(timeout, || spatial_store.zones_intersecting(&start, &end))
                        .await?
                }
            };
            Ok::<_, Error>(SegmentZones { segment, zones })
        })
        .buffered(settings.lookup_concurrency.max(1))
        .try_collect()
        .await?;

    let excursion_ids: Vec<ExcursionId> = segments
        .iter()
        .map(|s| s.segment.segment.excursion_id)
        .unique()
        .collect();

    let excursions = shared_state
        .aggregation_outbound
        .excursions_by_ids(&excursion_ids)
        .await?;

    let (batch, new_watermark) = aggregate(segments, excursions)?;
    let new_watermark = new_watermark.unwrap_or(watermark);

    report.num_relations = batch.relations.len() as u32;
    report.num_metrics = batch.metrics.len() as u32;
    report.num_excursions = batch.excursions.len() as u32;

    shared_state
        .aggregation_inbound
        .commit_aggregation(
            batch,
            CheckpointAdvance {
                task_name,
                point_in_time: new_watermark,
                duration: Some(Utc::now() - started),
                position_count: report.num_segments as i64,
            },
        )
        .await?;

    progress.watermark = Some(new_watermark);
    progress.num_succeeded = report.num_segments;
    report.watermark = Some(new_watermark);

    info!(
        "classified {} segments into {} metrics rows across {} excursions",
        report.num_segments, report.num_metrics, report.num_excursions
    );

    Ok(report)
}
