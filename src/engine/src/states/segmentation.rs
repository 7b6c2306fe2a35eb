use std::{cmp::min, collections::BTreeMap, sync::Arc};

use async_channel::bounded;
use chrono::{DateTime, Duration, Utc};
use snafu::ResultExt;
use tokio::{sync::mpsc::channel, task::JoinSet};
use tracing::{error, info, instrument};
use trawlwatch_core::{
    CheckpointAdvance, DateRange, SegmentationBatch, SegmentationRetry, TaskName, VesselId,
    VesselSegmentation, retry_with_timeout,
};

use crate::{
    error::{
        Result,
        error::{ChannelClosedSnafu, JoinSnafu},
    },
    *,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentationReport {
    pub num_vessels: u32,
    pub num_failed: u32,
    /// Vessels picked up again from a retry left by an earlier run.
    pub num_resumed: u32,
    pub num_positions: u32,
    pub num_discarded: u32,
    pub num_segments: u32,
    pub num_new_excursions: u32,
    pub num_closed_excursions: u32,
    /// The committed watermark, `None` if nothing was committed.
    pub watermark: Option<DateTime<Utc>>,
}

impl std::ops::Add<&VesselSegmentation> for SegmentationReport {
    type Output = SegmentationReport;

    fn add(mut self, rhs: &VesselSegmentation) -> Self::Output {
        self.num_vessels += 1;
        self.num_positions += rhs.num_positions as u32;
        self.num_discarded += rhs.num_discarded as u32;
        self.num_segments += rhs.segments.len() as u32;
        self.num_new_excursions += rhs.new_excursions.len() as u32;
        self.num_closed_excursions += rhs.closed_excursions.len() as u32;
        self
    }
}

/// The position ingestion window of a single run and whether `batch_window` capped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationWindow {
    pub range: DateRange,
    pub capped: bool,
}

impl SegmentationWindow {
    pub fn new(
        watermark: DateTime<Utc>,
        now: DateTime<Utc>,
        batch_window: std::time::Duration,
    ) -> Result<SegmentationWindow> {
        let limit = Duration::from_std(batch_window)
            .ok()
            .and_then(|w| watermark.checked_add_signed(w));

        let (end, capped) = match limit {
            Some(limit) if limit < now => (limit, true),
            _ => (now.max(watermark), false),
        };

        Ok(SegmentationWindow {
            range: DateRange::new(watermark, end)?,
            capped,
        })
    }
}

#[instrument(skip_all)]
pub async fn run_segmentation(
    shared_state: Arc<SharedState>,
    progress: &mut StageProgress,
) -> Result<SegmentationReport> {
    let started = Utc::now();
    let task_name = TaskName::IngestAndSegment;

    let watermark = shared_state
        .checkpoint_store
        .get_watermark(task_name)
        .await?;
    progress.watermark = Some(watermark);

    let window = SegmentationWindow::new(watermark, started, shared_state.settings.batch_window)?;
    let range = window.range;

    let vessels = shared_state
        .position_source
        .vessels_with_new_positions(&range)
        .await?;

    let retries = shared_state
        .segmentation_outbound
        .pending_retries()
        .await?;

    let mut work: BTreeMap<VesselId, DateRange> =
        vessels.into_iter().map(|v| (v, range)).collect();

    // A vessel left behind by a failed run resumes from where it failed.
    for retry in &retries {
        let start = min(retry.resume_from, range.start());
        work.insert(retry.vessel_id, DateRange::new(start, range.end())?);
    }

    if work.is_empty() {
        let mut report = SegmentationReport::default();
        if window.capped && !range.is_empty() {
            shared_state
                .checkpoint_store
                .advance_watermark(CheckpointAdvance {
                    task_name,
                    point_in_time: range.end(),
                    duration: Some(Utc::now() - started),
                    position_count: 0,
                })
                .await?;
            progress.watermark = Some(range.end());
            report.watermark = Some(range.end());
        }
        return Ok(report);
    }

    let num_vessels = work.len();
    let num_workers = min(num_vessels, shared_state.settings.num_workers.max(1) as usize);

    let (master_tx, mut master_rx) = channel(num_workers);
    let (worker_tx, worker_rx) = bounded(num_vessels);

    let mut workers = JoinSet::new();

    for _ in 0..num_workers {
        let master_tx = master_tx.clone();
        let worker_rx = worker_rx.clone();
        let shared_state = shared_state.clone();

        workers.spawn(async move {
            while let Ok((vessel_id, range)) = worker_rx.recv().await {
                let result = process_vessel(&shared_state, vessel_id, range).await;
                if master_tx.send((vessel_id, result)).await.is_err() {
                    break;
                }
            }
        });
    }

    drop(master_tx);

    for (vessel_id, vessel_range) in &work {
        if worker_tx.try_send((*vessel_id, *vessel_range)).is_err() {
            workers.shutdown().await;
            return ChannelClosedSnafu.fail();
        }
    }

    drop(worker_tx);

    let mut report = SegmentationReport {
        num_resumed: retries.len() as u32,
        ..Default::default()
    };
    let mut batch = SegmentationBatch::default();

    while let Some((vessel_id, result)) = master_rx.recv().await {
        let Some(vessel_range) = work.remove(&vessel_id) else {
            continue;
        };
        match result {
            Ok(vessel) => {
                report = report + &vessel;
                progress.num_succeeded += 1;
                batch.vessels.push(vessel);
            }
            Err(e) => {
                error!("failed to segment vessel: {vessel_id}, err: {e:?}");
                report.num_failed += 1;
                progress.num_failed += 1;
                batch.retries.push(SegmentationRetry {
                    vessel_id,
                    resume_from: vessel_range.start(),
                });
            }
        }
    }

    while let Some(joined) = workers.join_next().await {
        joined.context(JoinSnafu)?;
    }

    // Vessels lost to a worker exiting early are retried like failed ones.
    for (vessel_id, vessel_range) in work {
        report.num_failed += 1;
        progress.num_failed += 1;
        batch.retries.push(SegmentationRetry {
            vessel_id,
            resume_from: vessel_range.start(),
        });
    }

    if report.num_failed > 0 {
        error!(
            "{} of {num_vessels} vessels failed and are retried on the next run",
            report.num_failed
        );
    }

    // Positions of failed vessels are covered by their retries, so the watermark only has
    // to account for the vessels that were committed.
    let point_in_time = batch
        .vessels
        .iter()
        .filter_map(|v| v.max_created_at)
        .max()
        .map(|latest| latest.max(watermark))
        .unwrap_or(if window.capped {
            range.end()
        } else {
            watermark
        });

    let checkpoint = CheckpointAdvance {
        task_name,
        point_in_time,
        duration: Some(Utc::now() - started),
        position_count: report.num_positions as i64,
    };

    shared_state
        .segmentation_inbound
        .commit_segmentation(batch, Some(checkpoint))
        .await?;

    progress.watermark = Some(point_in_time);
    report.watermark = Some(point_in_time);

    info!(
        "segmented {} positions of {num_vessels} vessels into {} segments",
        report.num_positions, report.num_segments
    );

    Ok(report)
}

/// Segments the vessel's new positions and assigns the segments to excursions.
#[instrument(skip(shared_state, range))]
pub async fn process_vessel(
    shared_state: &SharedState,
    vessel_id: VesselId,
    range: DateRange,
) -> Result<VesselSegmentation> {
    let config = &shared_state.settings.segmentation;

    let history =
        load_vessel_history(shared_state.segmentation_outbound.as_ref(), vessel_id).await?;

    let positions = shared_state
        .position_source
        .positions_since(vessel_id, &range)
        .await?;

    let mut output = VesselSegmentation::new(vessel_id);
    output.num_positions = positions.len();
    output.max_created_at = positions.iter().map(|p| p.created_at).max();

    let candidates = match segment_positions(history.anchor.as_ref(), positions, config) {
        SegmentationOutcome::NoData { num_discarded } => {
            output.num_discarded = num_discarded;
            return Ok(output);
        }
        SegmentationOutcome::Segments {
            segments,
            num_discarded,
        } => {
            output.num_discarded = num_discarded;
            segments
        }
    };

    output.previous_anchor = history.anchor.map(|a| a.id);

    let mut machine = ExcursionStatemachine::new(vessel_id, history.excursion_state, config);

    for candidate in candidates {
        let port = if machine.needs_port_lookup(&candidate) {
            let end = candidate.end_position;
            retry_with_timeout(shared_state.settings.spatial_timeout, || {
                shared_state
                    .spatial_store
                    .nearest_port(&end, config.port_radius_meters)
            })
            .await?
        } else {
            None
        };

        output.segments.push(machine.advance(candidate, port));
    }

    let ExcursionOutput {
        new_excursions,
        closed_excursions,
        ports_with_activity,
    } = machine.finish();

    output.new_excursions = new_excursions;
    output.closed_excursions = closed_excursions;
    output.ports_with_activity = ports_with_activity;

    Ok(output)
}
