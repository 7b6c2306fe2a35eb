use crate::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Vessels with at least one position whose `created_at` falls within `range`.
    async fn vessels_with_new_positions(&self, range: &DateRange) -> CoreResult<Vec<VesselId>>;
    /// Positions of the vessel created within `range`, ordered by `timestamp` ascending.
    async fn positions_since(
        &self,
        vessel_id: VesselId,
        range: &DateRange,
    ) -> CoreResult<Vec<Position>>;
}

#[async_trait]
pub trait SpatialStore: Send + Sync {
    async fn nearest_port(&self, point: &Point, radius_meters: f64) -> CoreResult<Option<PortId>>;
    async fn zones_intersecting(&self, start: &Point, end: &Point) -> CoreResult<Vec<Zone>>;
}

#[async_trait]
pub trait SegmentationOutbound: Send + Sync {
    /// All segments flagged as `last_vessel_segment` for the vessel, more than one is an
    /// inconsistency the caller has to detect.
    async fn last_vessel_segments(&self, vessel_id: VesselId) -> CoreResult<Vec<Segment>>;
    async fn excursion(&self, id: ExcursionId) -> CoreResult<Option<Excursion>>;
    async fn open_excursions(&self, vessel_id: VesselId) -> CoreResult<Vec<Excursion>>;
    /// The most recently created excursion of the vessel regardless of its state.
    async fn last_excursion(&self, vessel_id: VesselId) -> CoreResult<Option<Excursion>>;
    /// Vessels left behind by earlier failed runs.
    async fn pending_retries(&self) -> CoreResult<Vec<SegmentationRetry>>;
}

#[async_trait]
pub trait AggregationOutbound: Send + Sync {
    /// Segments not yet matched to zones and modified after `since`, oldest first.
    async fn unmatched_segments(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> CoreResult<Vec<SegmentWithVessel>>;
    async fn excursions_by_ids(&self, ids: &[ExcursionId]) -> CoreResult<Vec<Excursion>>;
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// The task's watermark, the epoch if the task never ran.
    async fn get_watermark(&self, task_name: TaskName) -> CoreResult<DateTime<Utc>>;
    async fn task_execution(&self, task_name: TaskName) -> CoreResult<Option<TaskExecution>>;
    /// Marks the task as in flight, fails with `TaskInFlight` unless the previous marker is
    /// absent or older than `stale_after`.
    async fn begin_task(&self, task_name: TaskName, stale_after: std::time::Duration)
    -> CoreResult<()>;
    async fn release_task(&self, task_name: TaskName) -> CoreResult<()>;
    async fn advance_watermark(&self, checkpoint: CheckpointAdvance) -> CoreResult<()>;
}
