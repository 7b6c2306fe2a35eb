use std::sync::Arc;

use snafu::IntoError;
use tracing::{error, info, instrument, warn};
use trawlwatch_core::TaskName;

use crate::{
    error::{Result, error::StageSnafu},
    *,
};

/// Runs the stages in order, each one guarded by its task's in-flight marker.
pub struct Pipeline {
    shared_state: Arc<SharedState>,
    single_stage_run: Option<TaskName>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub segmentation: Option<SegmentationReport>,
    pub aggregation: Option<AggregationReport>,
}

impl Pipeline {
    pub fn new(shared_state: SharedState, single_stage_run: Option<TaskName>) -> Pipeline {
        Pipeline {
            shared_state: Arc::new(shared_state),
            single_stage_run,
        }
    }

    pub fn stages(&self) -> Vec<TaskName> {
        match self.single_stage_run {
            Some(task_name) => vec![task_name],
            None => vec![TaskName::IngestAndSegment, TaskName::ClassifyAndAggregate],
        }
    }

    pub async fn run(&self) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        for task_name in self.stages() {
            match self.run_stage(task_name).await? {
                StageReport::Segmentation(r) => report.segmentation = Some(r),
                StageReport::Aggregation(r) => report.aggregation = Some(r),
            }
        }

        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn run_stage(&self, task_name: TaskName) -> Result<StageReport> {
        let mut progress = StageProgress::default();
        let checkpoint_store = &self.shared_state.checkpoint_store;

        if let Err(e) = checkpoint_store
            .begin_task(task_name, self.shared_state.settings.in_flight_stale_after)
            .await
        {
            return Err(stage_error(task_name, &progress, e.into()));
        }

        let result = match task_name {
            TaskName::IngestAndSegment => {
                run_segmentation(self.shared_state.clone(), &mut progress)
                    .await
                    .map(StageReport::Segmentation)
            }
            TaskName::ClassifyAndAggregate => run_aggregation(&self.shared_state, &mut progress)
                .await
                .map(StageReport::Aggregation),
        };

        if let Err(e) = checkpoint_store.release_task(task_name).await {
            warn!("failed to release task '{task_name}': {e:?}");
        }

        match result {
            Ok(report) => {
                info!("stage '{task_name}' completed: {report:?}");
                Ok(report)
            }
            Err(e) => {
                error!("stage '{task_name}' failed: {e:?}");
                Err(stage_error(task_name, &progress, e))
            }
        }
    }
}

fn stage_error(task_name: TaskName, progress: &StageProgress, source: Error) -> Error {
    StageSnafu {
        task_name,
        watermark: progress.watermark,
        num_succeeded: progress.num_succeeded,
        num_failed: progress.num_failed,
    }
    .into_error(Box::new(source))
}
