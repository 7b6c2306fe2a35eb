use crate::{PostgresAdapter, error::Result, models::Zone};
use trawlwatch_core::Point;

impl PostgresAdapter {
    pub(crate) async fn zones_intersecting_impl(
        &self,
        start: &Point,
        end: &Point,
    ) -> Result<Vec<Zone>> {
        let zones = sqlx::query_as::<_, Zone>(
            r#"
SELECT
    zone_id,
    category,
    sub_category,
    "name",
    "geometry",
    COALESCE(json_data -> 'beneficiaries', '[]'::JSONB) AS beneficiaries
FROM
    zones
WHERE
    ST_Intersects (
        "geometry",
        ST_SetSRID (
            ST_MakeLine (ST_MakePoint ($1, $2), ST_MakePoint ($3, $4)),
            4326
        )
    )
ORDER BY
    zone_id
            "#,
        )
        .bind(start.longitude)
        .bind(start.latitude)
        .bind(end.longitude)
        .bind(end.latitude)
        .fetch_all(&self.pool)
        .await?;

        Ok(zones)
    }
}
