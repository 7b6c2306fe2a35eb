use crate::{
    PostgresAdapter,
    error::Result,
    models::{Excursion, seconds},
};
use trawlwatch_core::{ExcursionArrival, ExcursionId, ExcursionTotalsUpdate, NewExcursion, VesselId};

static EXCURSION_COLUMNS: &str = r#"
    excursion_id,
    vessel_id,
    departure_port_id,
    departure_at,
    ST_Y (departure_position) AS departure_latitude,
    ST_X (departure_position) AS departure_longitude,
    arrival_port_id,
    arrival_at,
    ST_Y (arrival_position) AS arrival_latitude,
    ST_X (arrival_position) AS arrival_longitude,
    excursion_duration,
    total_time_at_sea,
    total_time_in_amp,
    total_time_in_territorial_waters,
    total_time_in_zones_with_no_fishing_rights,
    total_time_fishing,
    total_time_fishing_in_amp,
    total_time_fishing_in_territorial_waters,
    total_time_fishing_in_zones_with_no_fishing_rights,
    total_time_default_ais,
    created_at,
    updated_at
"#;

impl PostgresAdapter {
    pub(crate) async fn excursion_impl(&self, id: ExcursionId) -> Result<Option<Excursion>> {
        let sql = format!("SELECT {EXCURSION_COLUMNS} FROM excursions WHERE excursion_id = $1");

        let excursion = sqlx::query_as::<_, Excursion>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(excursion)
    }

    pub(crate) async fn open_excursions_impl(&self, vessel_id: VesselId) -> Result<Vec<Excursion>> {
        let sql = format!(
            r#"
SELECT
    {EXCURSION_COLUMNS}
FROM
    excursions
WHERE
    vessel_id = $1
    AND arrival_at IS NULL
ORDER BY
    excursion_id
            "#
        );

        let excursions = sqlx::query_as::<_, Excursion>(&sql)
            .bind(vessel_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(excursions)
    }

    pub(crate) async fn last_excursion_impl(
        &self,
        vessel_id: VesselId,
    ) -> Result<Option<Excursion>> {
        let sql = format!(
            r#"
SELECT
    {EXCURSION_COLUMNS}
FROM
    excursions
WHERE
    vessel_id = $1
ORDER BY
    excursion_id DESC
LIMIT
    1
            "#
        );

        let excursion = sqlx::query_as::<_, Excursion>(&sql)
            .bind(vessel_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(excursion)
    }

    pub(crate) async fn excursions_by_ids_impl(
        &self,
        ids: &[ExcursionId],
    ) -> Result<Vec<Excursion>> {
        let ids: Vec<i64> = ids.iter().map(|i| i.into_inner()).collect();
        let sql = format!(
            r#"
SELECT
    {EXCURSION_COLUMNS}
FROM
    excursions
WHERE
    excursion_id = ANY ($1::BIGINT[])
            "#
        );

        let excursions = sqlx::query_as::<_, Excursion>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(excursions)
    }

    pub(crate) async fn add_excursion(
        &self,
        excursion: &NewExcursion,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<ExcursionId> {
        let departure = &excursion.departure;
        let arrival = excursion.arrival.as_ref();

        let id = sqlx::query_scalar::<_, ExcursionId>(
            r#"
INSERT INTO
    excursions (
        vessel_id,
        departure_port_id,
        departure_at,
        departure_position,
        arrival_port_id,
        arrival_at,
        arrival_position
    )
VALUES
    (
        $1,
        $2,
        $3,
        ST_SetSRID (ST_MakePoint ($4, $5), 4326),
        $6,
        $7,
        ST_SetSRID (ST_MakePoint ($8, $9), 4326)
    )
RETURNING
    excursion_id
            "#,
        )
        .bind(excursion.vessel_id)
        .bind(departure.port_id)
        .bind(departure.timestamp)
        .bind(departure.position.map(|p| p.longitude))
        .bind(departure.position.map(|p| p.latitude))
        .bind(arrival.map(|a| a.port_id))
        .bind(arrival.map(|a| a.timestamp))
        .bind(arrival.map(|a| a.position.longitude))
        .bind(arrival.map(|a| a.position.latitude))
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    pub(crate) async fn close_excursions(
        &self,
        arrivals: &[ExcursionArrival],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if arrivals.is_empty() {
            return Ok(());
        }

        let excursion_id: Vec<i64> = arrivals.iter().map(|a| a.excursion_id.into_inner()).collect();
        let port_id: Vec<i64> = arrivals
            .iter()
            .map(|a| a.arrival.port_id.into_inner())
            .collect();
        let arrival_at: Vec<_> = arrivals.iter().map(|a| a.arrival.timestamp).collect();
        let latitude: Vec<f64> = arrivals.iter().map(|a| a.arrival.position.latitude).collect();
        let longitude: Vec<f64> = arrivals.iter().map(|a| a.arrival.position.longitude).collect();

        sqlx::query(
            r#"
UPDATE excursions e
SET
    arrival_port_id = u.port_id,
    arrival_at = u.arrival_at,
    arrival_position = ST_SetSRID (ST_MakePoint (u.longitude, u.latitude), 4326),
    updated_at = NOW()
FROM
    UNNEST(
        $1::BIGINT[],
        $2::BIGINT[],
        $3::TIMESTAMPTZ[],
        $4::DOUBLE PRECISION[],
        $5::DOUBLE PRECISION[]
    ) AS u (excursion_id, port_id, arrival_at, latitude, longitude)
WHERE
    e.excursion_id = u.excursion_id
            "#,
        )
        .bind(excursion_id)
        .bind(port_id)
        .bind(arrival_at)
        .bind(latitude)
        .bind(longitude)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub(crate) async fn update_excursion_totals(
        &self,
        updates: &[ExcursionTotalsUpdate],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let column = |f: fn(&ExcursionTotalsUpdate) -> chrono::Duration| -> Vec<f64> {
            updates.iter().map(|u| seconds(f(u))).collect()
        };
        let excursion_id: Vec<i64> = updates.iter().map(|u| u.excursion_id.into_inner()).collect();

        sqlx::query(
            r#"
UPDATE excursions e
SET
    excursion_duration = u.excursion_duration,
    total_time_at_sea = u.total_time_at_sea,
    total_time_in_amp = u.total_time_in_amp,
    total_time_in_territorial_waters = u.total_time_in_territorial_waters,
    total_time_in_zones_with_no_fishing_rights = u.total_time_in_zones_with_no_fishing_rights,
    total_time_fishing = u.total_time_fishing,
    total_time_fishing_in_amp = u.total_time_fishing_in_amp,
    total_time_fishing_in_territorial_waters = u.total_time_fishing_in_territorial_waters,
    total_time_fishing_in_zones_with_no_fishing_rights = u.total_time_fishing_in_zones_with_no_fishing_rights,
    total_time_default_ais = u.total_time_default_ais,
    updated_at = NOW()
FROM
    UNNEST(
        $1::BIGINT[],
        $2::DOUBLE PRECISION[],
        $3::DOUBLE PRECISION[],
        $4::DOUBLE PRECISION[],
        $5::DOUBLE PRECISION[],
        $6::DOUBLE PRECISION[],
        $7::DOUBLE PRECISION[],
        $8::DOUBLE PRECISION[],
        $9::DOUBLE PRECISION[],
        $10::DOUBLE PRECISION[],
        $11::DOUBLE PRECISION[]
    ) AS u (
        excursion_id,
        excursion_duration,
        total_time_at_sea,
        total_time_in_amp,
        total_time_in_territorial_waters,
        total_time_in_zones_with_no_fishing_rights,
        total_time_fishing,
        total_time_fishing_in_amp,
        total_time_fishing_in_territorial_waters,
        total_time_fishing_in_zones_with_no_fishing_rights,
        total_time_default_ais
    )
WHERE
    e.excursion_id = u.excursion_id
            "#,
        )
        .bind(excursion_id)
        .bind(column(|u| u.totals.excursion_duration))
        .bind(column(|u| u.totals.total_time_at_sea))
        .bind(column(|u| u.totals.total_time_in_amp))
        .bind(column(|u| u.totals.total_time_in_territorial_waters))
        .bind(column(|u| u.totals.total_time_in_zones_with_no_fishing_rights))
        .bind(column(|u| u.totals.total_time_fishing))
        .bind(column(|u| u.totals.total_time_fishing_in_amp))
        .bind(column(|u| u.totals.total_time_fishing_in_territorial_waters))
        .bind(column(|u| {
            u.totals.total_time_fishing_in_zones_with_no_fishing_rights
        }))
        .bind(column(|u| u.totals.total_time_default_ais))
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
