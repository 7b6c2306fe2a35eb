use crate::{PostgresAdapter, error::Result, models::Position};
use trawlwatch_core::{DateRange, VesselId};

impl PostgresAdapter {
    pub(crate) async fn vessels_with_new_positions_impl(
        &self,
        range: &DateRange,
    ) -> Result<Vec<VesselId>> {
        let vessels = sqlx::query_scalar::<_, VesselId>(
            r#"
SELECT DISTINCT
    vessel_id
FROM
    positions
WHERE
    created_at > $1
    AND created_at <= $2
ORDER BY
    vessel_id
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await?;

        Ok(vessels)
    }

    pub(crate) async fn positions_since_impl(
        &self,
        vessel_id: VesselId,
        range: &DateRange,
    ) -> Result<Vec<Position>> {
        let positions = sqlx::query_as::<_, Position>(
            r#"
SELECT
    vessel_id,
    "timestamp",
    latitude,
    longitude,
    speed,
    heading,
    course,
    accuracy,
    collection_type,
    created_at
FROM
    positions
WHERE
    vessel_id = $1
    AND created_at > $2
    AND created_at <= $3
ORDER BY
    "timestamp" ASC,
    position_id ASC
            "#,
        )
        .bind(vessel_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await?;

        Ok(positions)
    }
}
