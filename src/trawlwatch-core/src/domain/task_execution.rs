use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Display, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskName {
    #[strum(serialize = "ingest_and_segment")]
    IngestAndSegment,
    #[strum(serialize = "classify_and_aggregate")]
    ClassifyAndAggregate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskExecution {
    pub task_name: TaskName,
    pub point_in_time: DateTime<Utc>,
    pub duration: Option<Duration>,
    pub position_count: i64,
    pub in_flight_since: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Checkpoint written in the same transaction as the work it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointAdvance {
    pub task_name: TaskName,
    pub point_in_time: DateTime<Utc>,
    pub duration: Option<Duration>,
    pub position_count: i64,
}

impl TaskName {
    /// Watermark used for tasks that have never run.
    pub fn initial_watermark() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }
}
