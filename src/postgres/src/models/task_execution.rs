use super::from_seconds;
use crate::error::{Error, error::TaskNameSnafu};
use chrono::{DateTime, Utc};
use snafu::ResultExt;
use sqlx::FromRow;
use std::str::FromStr;
use trawlwatch_core::TaskName;

#[derive(Debug, Clone, FromRow)]
pub struct TaskExecution {
    pub task_name: String,
    pub point_in_time: DateTime<Utc>,
    pub duration: Option<f64>,
    pub position_count: i64,
    pub in_flight_since: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TaskExecution> for trawlwatch_core::TaskExecution {
    type Error = Error;

    fn try_from(v: TaskExecution) -> Result<Self, Self::Error> {
        Ok(Self {
            task_name: TaskName::from_str(&v.task_name).context(TaskNameSnafu)?,
            point_in_time: v.point_in_time,
            duration: v.duration.map(from_seconds),
            position_count: v.position_count,
            in_flight_since: v.in_flight_since,
            updated_at: v.updated_at,
        })
    }
}
