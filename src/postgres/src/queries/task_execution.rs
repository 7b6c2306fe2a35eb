use crate::{
    PostgresAdapter,
    error::Result,
    models::{TaskExecution, seconds},
};
use chrono::{DateTime, Utc};
use trawlwatch_core::{CheckpointAdvance, TaskName};

impl PostgresAdapter {
    pub(crate) async fn task_execution_impl(
        &self,
        task_name: TaskName,
    ) -> Result<Option<TaskExecution>> {
        let execution = sqlx::query_as::<_, TaskExecution>(
            r#"
SELECT
    task_name,
    point_in_time,
    duration,
    position_count,
    in_flight_since,
    updated_at
FROM
    task_executions
WHERE
    task_name = $1
            "#,
        )
        .bind(task_name.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(execution)
    }

    pub(crate) async fn watermark_impl(&self, task_name: TaskName) -> Result<DateTime<Utc>> {
        let watermark = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
SELECT
    point_in_time
FROM
    task_executions
WHERE
    task_name = $1
            "#,
        )
        .bind(task_name.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(watermark.unwrap_or_else(TaskName::initial_watermark))
    }

    /// Returns false if another run holds a marker younger than `stale_after`.
    pub(crate) async fn begin_task_impl(
        &self,
        task_name: TaskName,
        stale_after: std::time::Duration,
    ) -> Result<bool> {
        let acquired = sqlx::query_scalar::<_, String>(
            r#"
INSERT INTO
    task_executions (task_name, point_in_time, in_flight_since)
VALUES
    ($1, $2, NOW())
ON CONFLICT (task_name) DO UPDATE
SET
    in_flight_since = NOW(),
    updated_at = NOW()
WHERE
    task_executions.in_flight_since IS NULL
    OR task_executions.in_flight_since < NOW() - MAKE_INTERVAL(secs => $3)
RETURNING
    task_name
            "#,
        )
        .bind(task_name.as_ref())
        .bind(TaskName::initial_watermark())
        .bind(stale_after.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(acquired.is_some())
    }

    pub(crate) async fn release_task_impl(&self, task_name: TaskName) -> Result<()> {
        sqlx::query(
            r#"
UPDATE task_executions
SET
    in_flight_since = NULL,
    updated_at = NOW()
WHERE
    task_name = $1
            "#,
        )
        .bind(task_name.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub(crate) async fn store_checkpoint<'e, E>(
        &self,
        checkpoint: &CheckpointAdvance,
        executor: E,
    ) -> Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            r#"
INSERT INTO
    task_executions (task_name, point_in_time, duration, position_count)
VALUES
    ($1, $2, $3, $4)
ON CONFLICT (task_name) DO UPDATE
SET
    point_in_time = EXCLUDED.point_in_time,
    duration = EXCLUDED.duration,
    position_count = EXCLUDED.position_count,
    updated_at = NOW()
            "#,
        )
        .bind(checkpoint.task_name.as_ref())
        .bind(checkpoint.point_in_time)
        .bind(checkpoint.duration.map(seconds))
        .bind(checkpoint.position_count)
        .execute(executor)
        .await?;

        Ok(())
    }
}
