use crate::{PostgresAdapter, error::Result, models::seconds};
use trawlwatch_core::{NewMetrics, SegmentZone};

impl PostgresAdapter {
    pub(crate) async fn add_segment_zones(
        &self,
        relations: &[SegmentZone],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if relations.is_empty() {
            return Ok(());
        }

        let segment_id: Vec<i64> = relations.iter().map(|r| r.segment_id.into_inner()).collect();
        let zone_id: Vec<i64> = relations.iter().map(|r| r.zone_id.into_inner()).collect();

        sqlx::query(
            r#"
INSERT INTO
    segment_zones (segment_id, zone_id)
SELECT
    *
FROM
    UNNEST($1::BIGINT[], $2::BIGINT[])
ON CONFLICT DO NOTHING
            "#,
        )
        .bind(segment_id)
        .bind(zone_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Metrics are append-only, a replayed batch is ignored through the `(segment_id, zone_id)`
    /// unique constraint.
    pub(crate) async fn add_metrics(
        &self,
        metrics: Vec<NewMetrics>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if metrics.is_empty() {
            return Ok(());
        }

        let len = metrics.len();
        let mut timestamp = Vec::with_capacity(len);
        let mut vessel_id = Vec::with_capacity(len);
        let mut vessel_mmsi = Vec::with_capacity(len);
        let mut vessel_name = Vec::with_capacity(len);
        let mut vessel_imo = Vec::with_capacity(len);
        let mut vessel_country_iso3 = Vec::with_capacity(len);
        let mut metrics_type = Vec::with_capacity(len);
        let mut duration_total = Vec::with_capacity(len);
        let mut duration_fishing = Vec::with_capacity(len);
        let mut zone_id = Vec::with_capacity(len);
        let mut zone_category = Vec::with_capacity(len);
        let mut zone_sub_category = Vec::with_capacity(len);
        let mut zone_name = Vec::with_capacity(len);
        let mut segment_id = Vec::with_capacity(len);

        for m in metrics {
            timestamp.push(m.timestamp);
            vessel_id.push(m.vessel_id.into_inner());
            vessel_mmsi.push(m.vessel_mmsi);
            vessel_name.push(m.vessel_name);
            vessel_imo.push(m.vessel_imo);
            vessel_country_iso3.push(m.vessel_country_iso3);
            metrics_type.push(m.metrics_type.as_ref().to_string());
            duration_total.push(seconds(m.duration_total));
            duration_fishing.push(m.duration_fishing.map(seconds));
            zone_id.push(m.zone_id.into_inner());
            zone_category.push(m.zone_category);
            zone_sub_category.push(m.zone_sub_category);
            zone_name.push(m.zone_name);
            segment_id.push(m.segment_id.into_inner());
        }

        sqlx::query(
            r#"
INSERT INTO
    metrics (
        "timestamp",
        vessel_id,
        vessel_mmsi,
        vessel_name,
        vessel_imo,
        vessel_country_iso3,
        metrics_type,
        duration_total,
        duration_fishing,
        zone_id,
        zone_category,
        zone_sub_category,
        zone_name,
        segment_id
    )
SELECT
    *
FROM
    UNNEST(
        $1::TIMESTAMPTZ[],
        $2::BIGINT[],
        $3::INT[],
        $4::TEXT[],
        $5::INT[],
        $6::TEXT[],
        $7::TEXT[],
        $8::DOUBLE PRECISION[],
        $9::DOUBLE PRECISION[],
        $10::BIGINT[],
        $11::TEXT[],
        $12::TEXT[],
        $13::TEXT[],
        $14::BIGINT[]
    )
ON CONFLICT (segment_id, zone_id) DO NOTHING
            "#,
        )
        .bind(timestamp)
        .bind(vessel_id)
        .bind(vessel_mmsi)
        .bind(vessel_name)
        .bind(vessel_imo)
        .bind(vessel_country_iso3)
        .bind(metrics_type)
        .bind(duration_total)
        .bind(duration_fishing)
        .bind(zone_id)
        .bind(zone_category)
        .bind(zone_sub_category)
        .bind(zone_name)
        .bind(segment_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
