use crate::{
    PostgresAdapter,
    error::Result,
    models::{Segment, SegmentWithVessel, seconds},
};
use chrono::{DateTime, Utc};
use trawlwatch_core::{ExcursionId, NewSegment, SegmentId, SegmentZoneUpdate, VesselId};

static SEGMENT_COLUMNS: &str = r#"
    s.segment_id,
    s.vessel_id,
    s.excursion_id,
    s.timestamp_start,
    s.timestamp_end,
    ST_Y (s.start_position) AS start_latitude,
    ST_X (s.start_position) AS start_longitude,
    ST_Y (s.end_position) AS end_latitude,
    ST_X (s.end_position) AS end_longitude,
    s.distance,
    s.duration,
    s.average_speed,
    s.segment_type,
    s.in_amp_zone,
    s.in_territorial_waters,
    s.in_zone_with_no_fishing_rights,
    s.last_vessel_segment,
    s.zones_matched,
    s.created_at,
    s.updated_at
"#;

impl PostgresAdapter {
    pub(crate) async fn last_vessel_segments_impl(
        &self,
        vessel_id: VesselId,
    ) -> Result<Vec<Segment>> {
        let sql = format!(
            r#"
SELECT
    {SEGMENT_COLUMNS}
FROM
    segments s
WHERE
    s.vessel_id = $1
    AND s.last_vessel_segment
ORDER BY
    s.timestamp_end DESC
            "#
        );

        let segments = sqlx::query_as::<_, Segment>(&sql)
            .bind(vessel_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(segments)
    }

    pub(crate) async fn unmatched_segments_impl(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<SegmentWithVessel>> {
        let sql = format!(
            r#"
SELECT
    {SEGMENT_COLUMNS},
    v.mmsi AS vessel_mmsi,
    v.name AS vessel_name,
    v.imo AS vessel_imo,
    v.country_iso3 AS vessel_country_iso3
FROM
    segments s
    LEFT JOIN vessels v ON v.vessel_id = s.vessel_id
WHERE
    NOT s.zones_matched
    AND GREATEST(s.created_at, s.updated_at) >= $1
ORDER BY
    GREATEST(s.created_at, s.updated_at) ASC,
    s.segment_id ASC
LIMIT
    $2
            "#
        );

        let segments = sqlx::query_as::<_, SegmentWithVessel>(&sql)
            .bind(since)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(segments)
    }

    pub(crate) async fn unset_last_vessel_segment(
        &self,
        segments: &[SegmentId],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if segments.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = segments.iter().map(|s| s.into_inner()).collect();

        sqlx::query(
            r#"
UPDATE segments
SET
    last_vessel_segment = FALSE,
    updated_at = NOW()
WHERE
    segment_id = ANY ($1::BIGINT[])
            "#,
        )
        .bind(ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Inserts segments whose excursion references have already been resolved to ids.
    pub(crate) async fn add_segments(
        &self,
        segments: Vec<(NewSegment, ExcursionId)>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if segments.is_empty() {
            return Ok(());
        }

        let len = segments.len();
        let mut vessel_id = Vec::with_capacity(len);
        let mut excursion_id = Vec::with_capacity(len);
        let mut timestamp_start = Vec::with_capacity(len);
        let mut timestamp_end = Vec::with_capacity(len);
        let mut start_latitude = Vec::with_capacity(len);
        let mut start_longitude = Vec::with_capacity(len);
        let mut end_latitude = Vec::with_capacity(len);
        let mut end_longitude = Vec::with_capacity(len);
        let mut distance = Vec::with_capacity(len);
        let mut duration = Vec::with_capacity(len);
        let mut average_speed = Vec::with_capacity(len);
        let mut segment_type = Vec::with_capacity(len);
        let mut last_vessel_segment = Vec::with_capacity(len);

        for (s, id) in segments {
            vessel_id.push(s.vessel_id.into_inner());
            excursion_id.push(id.into_inner());
            timestamp_start.push(s.timestamp_start);
            timestamp_end.push(s.timestamp_end);
            start_latitude.push(s.start_position.latitude);
            start_longitude.push(s.start_position.longitude);
            end_latitude.push(s.end_position.latitude);
            end_longitude.push(s.end_position.longitude);
            distance.push(s.distance);
            duration.push(seconds(s.duration));
            average_speed.push(s.average_speed);
            segment_type.push(s.segment_type.as_ref().to_string());
            last_vessel_segment.push(s.last_vessel_segment);
        }

        sqlx::query(
            r#"
INSERT INTO
    segments (
        vessel_id,
        excursion_id,
        timestamp_start,
        timestamp_end,
        start_position,
        end_position,
        distance,
        duration,
        average_speed,
        segment_type,
        last_vessel_segment
    )
SELECT
    u.vessel_id,
    u.excursion_id,
    u.timestamp_start,
    u.timestamp_end,
    ST_SetSRID (ST_MakePoint (u.start_longitude, u.start_latitude), 4326),
    ST_SetSRID (ST_MakePoint (u.end_longitude, u.end_latitude), 4326),
    u.distance,
    u.duration,
    u.average_speed,
    u.segment_type,
    u.last_vessel_segment
FROM
    UNNEST(
        $1::BIGINT[],
        $2::BIGINT[],
        $3::TIMESTAMPTZ[],
        $4::TIMESTAMPTZ[],
        $5::DOUBLE PRECISION[],
        $6::DOUBLE PRECISION[],
        $7::DOUBLE PRECISION[],
        $8::DOUBLE PRECISION[],
        $9::DOUBLE PRECISION[],
        $10::DOUBLE PRECISION[],
        $11::DOUBLE PRECISION[],
        $12::TEXT[],
        $13::BOOLEAN[]
    ) AS u (
        vessel_id,
        excursion_id,
        timestamp_start,
        timestamp_end,
        start_latitude,
        start_longitude,
        end_latitude,
        end_longitude,
        distance,
        duration,
        average_speed,
        segment_type,
        last_vessel_segment
    )
            "#,
        )
        .bind(vessel_id)
        .bind(excursion_id)
        .bind(timestamp_start)
        .bind(timestamp_end)
        .bind(start_latitude)
        .bind(start_longitude)
        .bind(end_latitude)
        .bind(end_longitude)
        .bind(distance)
        .bind(duration)
        .bind(average_speed)
        .bind(segment_type)
        .bind(last_vessel_segment)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub(crate) async fn update_segment_zones(
        &self,
        updates: &[SegmentZoneUpdate],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let segment_id: Vec<i64> = updates.iter().map(|u| u.segment_id.into_inner()).collect();
        let in_amp_zone: Vec<bool> = updates.iter().map(|u| u.flags.in_amp_zone).collect();
        let in_territorial_waters: Vec<bool> = updates
            .iter()
            .map(|u| u.flags.in_territorial_waters)
            .collect();
        let in_zone_with_no_fishing_rights: Vec<bool> = updates
            .iter()
            .map(|u| u.flags.in_zone_with_no_fishing_rights)
            .collect();

        sqlx::query(
            r#"
UPDATE segments s
SET
    in_amp_zone = u.in_amp_zone,
    in_territorial_waters = u.in_territorial_waters,
    in_zone_with_no_fishing_rights = u.in_zone_with_no_fishing_rights,
    zones_matched = TRUE,
    updated_at = NOW()
FROM
    UNNEST(
        $1::BIGINT[],
        $2::BOOLEAN[],
        $3::BOOLEAN[],
        $4::BOOLEAN[]
    ) AS u (
        segment_id,
        in_amp_zone,
        in_territorial_waters,
        in_zone_with_no_fishing_rights
    )
WHERE
    s.segment_id = u.segment_id
            "#,
        )
        .bind(segment_id)
        .bind(in_amp_zone)
        .bind(in_territorial_waters)
        .bind(in_zone_with_no_fishing_rights)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
