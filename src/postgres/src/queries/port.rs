use crate::{PostgresAdapter, error::Result};
use trawlwatch_core::{Point, PortId};

impl PostgresAdapter {
    pub(crate) async fn nearest_port_impl(
        &self,
        point: &Point,
        radius_meters: f64,
    ) -> Result<Option<PortId>> {
        let port = sqlx::query_scalar::<_, PortId>(
            r#"
SELECT
    port_id
FROM
    ports
WHERE
    ST_DWithin (
        "geometry"::geography,
        ST_SetSRID (ST_MakePoint ($1, $2), 4326)::geography,
        $3
    )
ORDER BY
    ST_Distance (
        "geometry"::geography,
        ST_SetSRID (ST_MakePoint ($1, $2), 4326)::geography
    ) ASC
LIMIT
    1
            "#,
        )
        .bind(point.longitude)
        .bind(point.latitude)
        .bind(radius_meters)
        .fetch_optional(&self.pool)
        .await?;

        Ok(port)
    }

    pub(crate) async fn mark_ports_with_activity(
        &self,
        ports: &[PortId],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if ports.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = ports.iter().map(|p| p.into_inner()).collect();

        sqlx::query(
            r#"
UPDATE ports
SET
    has_excursion_activity = TRUE
WHERE
    port_id = ANY ($1::BIGINT[])
    AND NOT has_excursion_activity
            "#,
        )
        .bind(ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
