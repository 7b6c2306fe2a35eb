use crate::{PostgresAdapter, error::Result, models::SegmentationRetry};
use chrono::{DateTime, Utc};
use trawlwatch_core::VesselId;

impl PostgresAdapter {
    pub(crate) async fn pending_retries_impl(&self) -> Result<Vec<SegmentationRetry>> {
        let retries = sqlx::query_as::<_, SegmentationRetry>(
            r#"
SELECT
    vessel_id,
    resume_from
FROM
    segmentation_retries
ORDER BY
    vessel_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(retries)
    }

    /// Records failed vessels, an already pending vessel keeps its earliest resume point.
    pub(crate) async fn add_retries(
        &self,
        retries: &[trawlwatch_core::SegmentationRetry],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if retries.is_empty() {
            return Ok(());
        }

        let (vessel_id, resume_from): (Vec<i64>, Vec<DateTime<Utc>>) = retries
            .iter()
            .map(|r| (r.vessel_id.into_inner(), r.resume_from))
            .unzip();

        sqlx::query(
            r#"
INSERT INTO
    segmentation_retries (vessel_id, resume_from)
SELECT
    *
FROM
    UNNEST($1::BIGINT[], $2::TIMESTAMPTZ[])
ON CONFLICT (vessel_id) DO UPDATE
SET
    resume_from = LEAST(segmentation_retries.resume_from, EXCLUDED.resume_from),
    updated_at = NOW()
            "#,
        )
        .bind(vessel_id)
        .bind(resume_from)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub(crate) async fn clear_retries(
        &self,
        vessels: &[VesselId],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if vessels.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = vessels.iter().map(|v| v.into_inner()).collect();

        sqlx::query(
            r#"
DELETE FROM segmentation_retries
WHERE
    vessel_id = ANY ($1::BIGINT[])
            "#,
        )
        .bind(ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
