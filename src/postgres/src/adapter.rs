use crate::{
    PsqlLogStatements, PsqlSettings,
    error::{
        Result,
        error::{ConnectionSnafu, MigrateSnafu},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use snafu::ResultExt;
use sqlx::{
    ConnectOptions, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use tracing::instrument;
use trawlwatch_core::*;

#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pub(crate) pool: PgPool,
}

impl PostgresAdapter {
    pub async fn new(settings: &PsqlSettings) -> Result<PostgresAdapter> {
        let mut opts = PgConnectOptions::new()
            .username(&settings.username)
            .password(&settings.password)
            .host(&settings.ip)
            .port(settings.port as u16)
            .options([("plan_cache_mode", "force_custom_plan")]);

        if let Some(db_name) = &settings.db_name {
            opts = opts.database(db_name);
        }

        if let Some(root_cert_path) = &settings.root_cert {
            opts = opts
                .ssl_root_cert(root_cert_path)
                .ssl_mode(PgSslMode::VerifyFull);
        }

        opts = match settings.log_statements {
            PsqlLogStatements::Enable => opts,
            PsqlLogStatements::Disable => opts.disable_statement_logging(),
        };

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(opts)
            .await
            .context(ConnectionSnafu)?;

        Ok(PostgresAdapter { pool })
    }

    pub async fn do_migrations(&self) -> Result<()> {
        sqlx::migrate!()
            .set_ignore_missing(true)
            .run(&self.pool)
            .await
            .context(MigrateSnafu)
    }

    async fn commit_segmentation_impl(
        &self,
        batch: SegmentationBatch,
        checkpoint: Option<CheckpointAdvance>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let segmented = batch
            .vessels
            .iter()
            .map(|v| v.vessel_id)
            .collect::<Vec<_>>();
        self.clear_retries(&segmented, &mut tx).await?;
        self.add_retries(&batch.retries, &mut tx).await?;

        for vessel in batch.vessels {
            // Existing excursions are closed before new ones are opened to keep the
            // single open excursion constraint satisfied at every statement.
            self.close_excursions(&vessel.closed_excursions, &mut tx)
                .await?;

            let mut new_ids = Vec::with_capacity(vessel.new_excursions.len());
            for e in &vessel.new_excursions {
                new_ids.push(self.add_excursion(e, &mut tx).await?);
            }

            if let Some(anchor) = vessel.previous_anchor {
                self.unset_last_vessel_segment(&[anchor], &mut tx).await?;
            }

            let segments = vessel
                .segments
                .into_iter()
                .map(|s| {
                    let id = match s.excursion {
                        ExcursionRef::Existing(id) => Some(id),
                        ExcursionRef::New(idx) => new_ids.get(idx).copied(),
                    };
                    id.map(|id| (s, id)).ok_or_else(|| {
                        crate::error::error::DataConversionSnafu {
                            description: format!(
                                "segment of vessel {} references an unknown new excursion",
                                vessel.vessel_id
                            ),
                        }
                        .build()
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            self.add_segments(segments, &mut tx).await?;

            let ports = vessel
                .ports_with_activity
                .into_iter()
                .unique()
                .collect::<Vec<_>>();
            self.mark_ports_with_activity(&ports, &mut tx).await?;
        }

        if let Some(checkpoint) = checkpoint {
            self.store_checkpoint(&checkpoint, &mut *tx).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn commit_aggregation_impl(
        &self,
        batch: AggregationBatch,
        checkpoint: CheckpointAdvance,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        self.update_segment_zones(&batch.segment_updates, &mut tx)
            .await?;
        self.add_segment_zones(&batch.relations, &mut tx).await?;
        self.add_metrics(batch.metrics, &mut tx).await?;
        self.update_excursion_totals(&batch.excursions, &mut tx)
            .await?;
        self.store_checkpoint(&checkpoint, &mut *tx).await?;

        tx.commit().await?;

        Ok(())
    }
}

#[async_trait]
impl PositionSource for PostgresAdapter {
    async fn vessels_with_new_positions(&self, range: &DateRange) -> CoreResult<Vec<VesselId>> {
        Ok(self.vessels_with_new_positions_impl(range).await?)
    }

    async fn positions_since(
        &self,
        vessel_id: VesselId,
        range: &DateRange,
    ) -> CoreResult<Vec<Position>> {
        Ok(self
            .positions_since_impl(vessel_id, range)
            .await?
            .into_iter()
            .map(Position::from)
            .collect())
    }
}

#[async_trait]
impl SpatialStore for PostgresAdapter {
    async fn nearest_port(&self, point: &Point, radius_meters: f64) -> CoreResult<Option<PortId>> {
        Ok(self.nearest_port_impl(point, radius_meters).await?)
    }

    async fn zones_intersecting(&self, start: &Point, end: &Point) -> CoreResult<Vec<Zone>> {
        Ok(self
            .zones_intersecting_impl(start, end)
            .await?
            .into_iter()
            .map(Zone::try_from)
            .collect::<Result<Vec<_>>>()?)
    }
}

#[async_trait]
impl SegmentationOutbound for PostgresAdapter {
    async fn last_vessel_segments(&self, vessel_id: VesselId) -> CoreResult<Vec<Segment>> {
        Ok(self
            .last_vessel_segments_impl(vessel_id)
            .await?
            .into_iter()
            .map(Segment::try_from)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn excursion(&self, id: ExcursionId) -> CoreResult<Option<Excursion>> {
        Ok(self
            .excursion_impl(id)
            .await?
            .map(Excursion::try_from)
            .transpose()?)
    }

    async fn open_excursions(&self, vessel_id: VesselId) -> CoreResult<Vec<Excursion>> {
        Ok(self
            .open_excursions_impl(vessel_id)
            .await?
            .into_iter()
            .map(Excursion::try_from)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn last_excursion(&self, vessel_id: VesselId) -> CoreResult<Option<Excursion>> {
        Ok(self
            .last_excursion_impl(vessel_id)
            .await?
            .map(Excursion::try_from)
            .transpose()?)
    }

    async fn pending_retries(&self) -> CoreResult<Vec<SegmentationRetry>> {
        Ok(self
            .pending_retries_impl()
            .await?
            .into_iter()
            .map(SegmentationRetry::from)
            .collect())
    }
}

#[async_trait]
impl SegmentationInbound for PostgresAdapter {
    #[instrument(
        skip_all,
        fields(num_vessels = batch.vessels.len(), num_retries = batch.retries.len())
    )]
    async fn commit_segmentation(
        &self,
        batch: SegmentationBatch,
        checkpoint: Option<CheckpointAdvance>,
    ) -> CoreResult<()> {
        Ok(self.commit_segmentation_impl(batch, checkpoint).await?)
    }
}

#[async_trait]
impl AggregationOutbound for PostgresAdapter {
    async fn unmatched_segments(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> CoreResult<Vec<SegmentWithVessel>> {
        Ok(self
            .unmatched_segments_impl(since, limit)
            .await?
            .into_iter()
            .map(SegmentWithVessel::try_from)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn excursions_by_ids(&self, ids: &[ExcursionId]) -> CoreResult<Vec<Excursion>> {
        Ok(self
            .excursions_by_ids_impl(ids)
            .await?
            .into_iter()
            .map(Excursion::try_from)
            .collect::<Result<Vec<_>>>()?)
    }
}

#[async_trait]
impl AggregationInbound for PostgresAdapter {
    #[instrument(skip_all, fields(num_segments = batch.segment_updates.len()))]
    async fn commit_aggregation(
        &self,
        batch: AggregationBatch,
        checkpoint: CheckpointAdvance,
    ) -> CoreResult<()> {
        Ok(self.commit_aggregation_impl(batch, checkpoint).await?)
    }
}

#[async_trait]
impl CheckpointStore for PostgresAdapter {
    async fn get_watermark(&self, task_name: TaskName) -> CoreResult<DateTime<Utc>> {
        Ok(self.watermark_impl(task_name).await?)
    }

    async fn task_execution(&self, task_name: TaskName) -> CoreResult<Option<TaskExecution>> {
        Ok(self
            .task_execution_impl(task_name)
            .await?
            .map(TaskExecution::try_from)
            .transpose()?)
    }

    async fn begin_task(
        &self,
        task_name: TaskName,
        stale_after: std::time::Duration,
    ) -> CoreResult<()> {
        if self.begin_task_impl(task_name, stale_after).await? {
            Ok(())
        } else {
            Err(Error::task_in_flight(task_name))
        }
    }

    async fn release_task(&self, task_name: TaskName) -> CoreResult<()> {
        Ok(self.release_task_impl(task_name).await?)
    }

    async fn advance_watermark(&self, checkpoint: CheckpointAdvance) -> CoreResult<()> {
        Ok(self.store_checkpoint(&checkpoint, &self.pool).await?)
    }
}
